use std::fs;
use std::path::PathBuf;

use similar_asserts::assert_eq;

use cpre::{Options, Preprocessor};

fn process(input: &str) -> String {
    Preprocessor::new()
        .process_text("test.h", input, Options::default())
        .expect("input should preprocess")
        .to_string()
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cpre-test-{tag}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_plain_source_passes_through() {
    assert_eq!(process("struct point { int x; int y; };"), "struct point { int x; int y; };");
}

#[test]
fn test_object_like_macro_expansion() {
    let out = process("#define SIZE 128\nint buffer[SIZE];");
    assert_eq!(out, "int buffer[128];");
}

#[test]
fn test_macro_bodies_are_frozen_at_definition() {
    let out = process("#define A 1\n#define B A + 1\n#undef A\nB");
    assert_eq!(out, "1 + 1");
}

#[test]
fn test_stringize() {
    let out = process("#define S(x) #x\nS(hello)");
    assert_eq!(out, "\"hello\"");
}

#[test]
fn test_token_paste() {
    let out = process("#define P(x) x##_suffix\nP(a)");
    assert_eq!(out, "a_suffix");
}

#[test]
fn test_function_macro_with_multiple_parameters() {
    let out = process("#define ADD(a, b) ((a) + (b))\nint r = ADD(1, f(2, 3));");
    assert_eq!(out, "int r = ((1) + (f(2, 3)));");
}

#[test]
fn test_undefined_name_without_arguments_passes_through() {
    let out = process("#define X 5\n#undef X\nX");
    assert_eq!(out, "X");
}

#[test]
fn test_undef_removes_the_definition_from_the_registry() {
    let output = Preprocessor::new()
        .process_text("test.h", "#define LIMIT 64\n#undef LIMIT\n", Options::default())
        .unwrap();
    assert!(!output.registry().defined("LIMIT"));
}

#[test]
fn test_object_like_macro_rejects_arguments_when_invoked() {
    let output = Preprocessor::new()
        .process_text("test.h", "#define EMPTY\n", Options::default())
        .unwrap();
    let directive = output.registry().find("EMPTY").unwrap();
    let error = directive.invoke("EMPTY", &["extra".to_string()]).unwrap_err();
    assert!(matches!(
        error,
        cpre::error::ErrorKind::ArgumentCount { max: 0, given: 1, .. }
    ));
}

#[test]
fn test_undefined_name_with_arguments_is_an_error() {
    let output = Preprocessor::new()
        .process_text("test.h", "#define F(a) a\n#undef F\n", Options::default())
        .unwrap();
    let error = cpre::executor::execute("F", &["1".to_string()], output.registry()).unwrap_err();
    assert!(matches!(
        error,
        cpre::error::ErrorKind::UnresolvedDirective(_)
    ));
    assert_eq!(
        cpre::executor::execute("F", &[], output.registry()).unwrap(),
        "F"
    );
}

#[test]
fn test_conditional_nesting_selects_else_branch() {
    let out = process("#if 1\n#if 0\nx\n#else\ny\n#endif\n#endif");
    assert_eq!(out, "y");
}

#[test]
fn test_ifdef_unknown_emits_nothing() {
    let out = process("#ifdef UNKNOWN\nbody\n#endif");
    assert_eq!(out, "");
}

#[test]
fn test_ifdef_on_defined_name() {
    let out = process("#define FEATURE\n#ifdef FEATURE\nenabled\n#endif");
    assert_eq!(out, "enabled");
}

#[test]
fn test_ifndef() {
    let out = process("#ifndef MISSING\nfallback\n#endif");
    assert_eq!(out, "fallback");
}

#[test]
fn test_elif_chain_takes_first_true_branch() {
    let out = process("#if 0\na\n#elif 1\nb\n#elif 1\nc\n#else\nd\n#endif");
    assert_eq!(out, "b");
}

#[test]
fn test_defined_operator_in_conditions() {
    let out = process("#define FOO 1\n#if defined(FOO) && !defined(BAR)\nyes\n#endif");
    assert_eq!(out, "yes");
}

#[test]
fn test_arithmetic_condition() {
    let out = process("#if (1+2)*3 == 9\nok\n#endif");
    assert_eq!(out, "ok");
}

#[test]
fn test_shift_binds_tighter_than_equality() {
    let out = process("#if 1 << 3 == 8\nok\n#endif");
    assert_eq!(out, "ok");
}

#[test]
fn test_stdc_version_is_usable_in_conditions() {
    let out = process("#if __STDC_VERSION__ >= 201112\nmodern\n#endif");
    assert_eq!(out, "modern");
}

#[test]
fn test_endif_without_if_is_an_error() {
    let error = Preprocessor::new()
        .process_text("test.h", "#endif\n", Options::default())
        .unwrap_err();
    assert!(matches!(
        error.kind,
        cpre::error::ErrorKind::MalformedConditional(_)
    ));
    assert_eq!(error.source_name.as_deref(), Some("test.h"));
}

#[test]
fn test_else_without_if_is_an_error() {
    let error = Preprocessor::new()
        .process_text("test.h", "#else\n", Options::default())
        .unwrap_err();
    assert!(matches!(
        error.kind,
        cpre::error::ErrorKind::MalformedConditional(_)
    ));
}

#[test]
fn test_commented_out_directives_are_inert() {
    let out = process("// #define HIDDEN 1\n/* #define ALSO 2 */\n#ifdef HIDDEN\nx\n#endif\nok");
    assert_eq!(out, "ok");
}

#[test]
fn test_continuation_lines_in_macro_body() {
    let out = process("#define LONG first \\\n  second\nLONG");
    assert_eq!(out, "first \n  second");
}

#[test]
fn test_include_from_override_source() {
    let mut pre = Preprocessor::new();
    pre.add_source("defs.h", "#define FROM_OVERRIDE 1\n");
    let out = pre
        .process_text(
            "test.h",
            "#include \"defs.h\"\n#ifdef FROM_OVERRIDE\nincluded\n#endif",
            Options::default(),
        )
        .unwrap()
        .to_string();
    assert_eq!(out, "included");
}

#[test]
fn test_override_wins_over_include_directory() {
    let dir = scratch_dir("override-wins");
    fs::write(dir.join("shared.h"), "from_disk\n").unwrap();

    let mut pre = Preprocessor::new();
    pre.include(dir.clone());
    pre.add_source("shared.h", "from_override\n");

    let out = pre
        .process_text("test.h", "#include <shared.h>\n", Options::default())
        .unwrap()
        .to_string();
    assert_eq!(out, "from_override");
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_include_from_directory() {
    let dir = scratch_dir("from-dir");
    fs::write(dir.join("lib.h"), "#define LIB_VERSION 3\n").unwrap();

    let mut pre = Preprocessor::new();
    pre.include(dir.clone());

    let out = pre
        .process_text(
            "test.h",
            "#include <lib.h>\nint v = LIB_VERSION;",
            Options::default(),
        )
        .unwrap()
        .to_string();
    assert_eq!(out, "int v = 3;");
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_include_is_an_error() {
    let error = Preprocessor::new()
        .process_text("test.h", "#include \"nowhere.h\"\n", Options::default())
        .unwrap_err();
    assert!(matches!(
        error.kind,
        cpre::error::ErrorKind::NotReadable(_)
    ));
    assert_eq!(error.source_name.as_deref(), Some("test.h"));
}

#[test]
fn test_include_inside_disabled_region_is_skipped() {
    let out = process("#if 0\n#include \"nowhere.h\"\n#endif\nok");
    assert_eq!(out, "ok");
}

#[test]
fn test_builtin_directives_are_rendered_in_front() {
    let out = process("#define FFI_SCOPE \"demo\"\nint x;");
    assert_eq!(out, "#define FFI_SCOPE \"demo\"\nint x;");
}

#[test]
fn test_builtin_rendering_can_be_suppressed() {
    let options = Options {
        skip_builtin_directives: true,
        ..Default::default()
    };
    let out = Preprocessor::new()
        .process_text("test.h", "#define FFI_SCOPE \"demo\"\nint x;", options)
        .unwrap()
        .to_string();
    assert_eq!(out, "int x;");
}

#[test]
fn test_extra_line_feeds_collapse_by_default() {
    let out = process("a\n\n\n\nb");
    assert_eq!(out, "a\nb");
}

#[test]
fn test_extra_line_feeds_can_be_kept() {
    let options = Options {
        keep_extra_line_feeds: true,
        ..Default::default()
    };
    let out = Preprocessor::new()
        .process_text("test.h", "a\n\n\nb", options)
        .unwrap()
        .to_string();
    assert_eq!(out, "a\n\n\nb");
}

#[test]
fn test_repeated_process_calls_start_clean() {
    let pre = Preprocessor::new();
    let first = pre
        .process_text("a.h", "#define ONCE 1\nONCE", Options::default())
        .unwrap()
        .to_string();
    assert_eq!(first, "1");
    let second = pre
        .process_text("b.h", "#ifdef ONCE\nleaked\n#endif\nclean", Options::default())
        .unwrap()
        .to_string();
    assert_eq!(second, "clean");
}

#[test]
fn test_cli_defines_apply() {
    let mut pre = Preprocessor::new();
    pre.define("DEBUG", "1");
    let out = pre
        .process_text(
            "test.h",
            "#ifdef DEBUG\nint trace;\n#endif",
            Options::default(),
        )
        .unwrap()
        .to_string();
    assert_eq!(out, "int trace;");
}

#[test]
fn test_counter_increments_across_includes() {
    let mut pre = Preprocessor::new();
    pre.add_source("inner.h", "__COUNTER__\n");
    let out = pre
        .process_text(
            "test.h",
            "__COUNTER__\n#include \"inner.h\"\n__COUNTER__\n",
            Options::default(),
        )
        .unwrap()
        .to_string();
    assert_eq!(out, "0\n1\n2");
}
