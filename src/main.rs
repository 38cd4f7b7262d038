mod app;
mod cli;

use tracing_subscriber::filter::LevelFilter;

fn main() {
    let cli = cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    app::run(cli);
}
