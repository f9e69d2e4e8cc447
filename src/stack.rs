//! The `#if`/`#elif`/`#else`/`#endif` state machine.
//!
//! Each frame tracks one level of conditional nesting. Output is available
//! only while every frame on the stack is enabled:
//!
//! ```text
//!  #if 1       // push(true)
//!    A         //  [true]: output available
//!    #if 0     // push(false)
//!      B       //  [true, false]: output suppressed
//!    #else     // inverse()
//!      C       //  [true, true]: output available
//!    #endif    // pop()
//!  #endif      // pop()
//! ```
//!
//! A frame's `completed` flag records whether some branch of its
//! `#if`/`#elif`/`#else` group has already been taken, so later branches in
//! the same group stay disabled even when their conditions hold.

/// Stack empty when a branch directive required a matching `#if`.
#[derive(Debug, PartialEq, Eq)]
pub struct EmptyStackError;

#[derive(Default)]
pub struct ConditionalStack {
    /// AND of every frame's enabled flag, refreshed after each mutation.
    active: bool,
    enabled: Vec<bool>,
    completed: Vec<bool>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self {
            active: true,
            enabled: Vec::new(),
            completed: Vec::new(),
        }
    }

    /// Whether output is currently eligible for emission.
    pub fn is_enabled(&self) -> bool {
        self.active
    }

    /// Whether the current branch group has already taken a branch.
    pub fn is_completed(&self) -> bool {
        self.completed.last().copied().unwrap_or(false)
    }

    pub fn push(&mut self, state: bool) {
        self.enabled.push(state);
        self.completed.push(state);
        if self.active && !state {
            self.active = false;
        }
    }

    /// Take the current `#elif` branch: the group is done after this frame.
    pub fn complete(&mut self) -> Result<(), EmptyStackError> {
        if self.enabled.is_empty() {
            return Err(EmptyStackError);
        }
        self.pop()?;
        self.push(true);
        Ok(())
    }

    /// Replace the top frame in place.
    pub fn update(&mut self, enabled: bool, completed: bool) -> Result<(), EmptyStackError> {
        if self.enabled.is_empty() {
            return Err(EmptyStackError);
        }
        self.enabled.pop();
        self.completed.pop();
        self.enabled.push(enabled);
        self.completed.push(completed);
        self.refresh();
        Ok(())
    }

    /// Invert the top frame's enabled flag (`#else` on an untaken group).
    pub fn inverse(&mut self) -> Result<(), EmptyStackError> {
        let top = self.enabled.last_mut().ok_or(EmptyStackError)?;
        *top = !*top;
        self.refresh();
        Ok(())
    }

    pub fn pop(&mut self) -> Result<bool, EmptyStackError> {
        self.completed.pop();
        let state = self.enabled.pop().ok_or(EmptyStackError)?;
        self.refresh();
        Ok(state)
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn refresh(&mut self) {
        self.active = self.enabled.iter().all(|state| *state);
    }
}
