use clap::Parser;

fn main() -> cpre::error::Result<()> {
    env_logger::init();
    let args = cpre::Args::parse();

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    cpre::run(stdout, stderr, args)
}
