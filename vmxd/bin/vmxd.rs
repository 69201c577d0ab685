use clap::Parser;
use vmxd::{cli::VmxdArgs, power::CliPowerController, server::VmxdServer, VmxdResult};

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> VmxdResult<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let args = VmxdArgs::parse();
    let config = args.resolve_config()?;
    let _guard = vmxd::init_logging(args.verbose, config.get_log_dir().as_deref())?;

    tracing::trace!("effective configuration: {config:?}");
    config.validate()?;

    let controller = CliPowerController::from_config(&config);
    VmxdServer::new(config, controller).serve().await?;

    Ok(())
}
