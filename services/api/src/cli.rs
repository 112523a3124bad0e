use crate::demo::{run_demo, DemoArgs};
use crate::server;
use admissions::config::LifecycleKind;
use admissions::error::AppError;
use admissions::workflows::admissions::{ApplicationStatus, InscriptionStatus, LifecycleState};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Admissions Lifecycle Service",
    about = "Run or inspect the admissions status-transition engine from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print a lifecycle's transition table as JSON
    Lifecycle(LifecycleArgs),
    /// Walk sample submissions through both lifecycles
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct LifecycleArgs {
    /// Lifecycle to describe: `application` or `inscription`
    #[arg(default_value = "application")]
    pub(crate) kind: String,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Lifecycle(args) => {
            println!("{}", describe_lifecycle(&args.kind)?);
            Ok(())
        }
        Command::Demo(args) => run_demo(args),
    }
}

pub(crate) fn describe_lifecycle(raw: &str) -> Result<String, AppError> {
    let description = match LifecycleKind::parse(raw)? {
        LifecycleKind::Application => {
            serde_json::to_string_pretty(&ApplicationStatus::standard_table().describe())?
        }
        LifecycleKind::Inscription => {
            serde_json::to_string_pretty(&InscriptionStatus::standard_table().describe())?
        }
    };
    Ok(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_inscription_table() {
        let rendered = describe_lifecycle("Inscriptions").expect("known lifecycle");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(value["lifecycle"], "inscription");
        assert_eq!(value["initial"], "PREINSCRIPTION");
        assert_eq!(value["sinks"], serde_json::json!(["REFUSE", "INSCRIT"]));
    }

    #[test]
    fn unknown_lifecycle_is_a_config_error() {
        let err = describe_lifecycle("enrollment").expect_err("unknown lifecycle");
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["admissions-api"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["admissions-api", "serve", "--port", "8088"])
            .expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Serve(ServeArgs { port: Some(8088), .. }))
        ));
    }
}
