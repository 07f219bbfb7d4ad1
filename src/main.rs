use anyhow::Context;
use dired::app::USAGE;
use dired::{error, App, CliArgs};

fn main() -> anyhow::Result<()> {
    error::setup_panic_handler();

    let args = CliArgs::parse(std::env::args().skip(1)).context("invalid arguments")?;
    if args.show_help {
        println!("{}", USAGE);
        return Ok(());
    }
    if args.show_version {
        println!("dired {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let app = App::new(&args).context("failed to load configuration")?;
    app.run().context("dired terminated with an error")?;
    Ok(())
}
