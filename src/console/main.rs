use anyhow::Context;
use clap::{Parser, Subcommand};
use dockyard::configuration::get_configuration;
use dockyard::console::commands::{apps, projects, registries, CallableTrait};
use dockyard::forms::RegistryForm;
use dockyard::models::RegistryType;
use dockyard::telemetry::{get_subscriber, init_subscriber};

/// Admin console over the app, project and registry store
#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Apps {
        #[command(subcommand)]
        command: AppsCommands,
    },
    Projects {
        #[command(subcommand)]
        command: ProjectsCommands,
    },
    Registries {
        #[command(subcommand)]
        command: RegistriesCommands,
    },
}

#[derive(Debug, Subcommand)]
enum AppsCommands {
    List {
        #[arg(long)]
        json: bool,
    },
    Register {
        name: String,
        #[arg(long)]
        persistent: bool,
    },
    Rename {
        old_name: String,
        new_name: String,
    },
    Delete {
        name: String,
    },
    /// Turn off default sub-domain SSL and force SSL everywhere
    DisableSsl,
}

#[derive(Debug, Subcommand)]
enum ProjectsCommands {
    List,
    Add {
        name: String,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete projects, children first
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum RegistriesCommands {
    List,
    Add {
        #[arg(long)]
        user: String,
        #[arg(long, env = "DOCKYARD_REGISTRY_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        domain: String,
        #[arg(long, default_value = "")]
        prefix: String,
        /// LOCAL_REG or REMOTE_REG
        #[arg(long, default_value = "REMOTE_REG")]
        registry_type: RegistryType,
    },
    Delete {
        id: String,
        #[arg(long)]
        allow_local: bool,
    },
    /// Pass an empty id to disable pushing
    SetDefault {
        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = get_configuration().context("Failed to read configuration")?;
    let subscriber = get_subscriber("dockyard".into(), settings.log_filter.clone(), std::io::stderr);
    init_subscriber(subscriber)?;

    get_command(cli).call(&settings)
}

fn get_command(cli: Cli) -> Box<dyn CallableTrait> {
    match cli.command {
        Commands::Apps { command } => match command {
            AppsCommands::List { json } => Box::new(apps::ListCommand::new(json)),
            AppsCommands::Register { name, persistent } => {
                Box::new(apps::RegisterCommand::new(name, persistent))
            }
            AppsCommands::Rename { old_name, new_name } => {
                Box::new(apps::RenameCommand::new(old_name, new_name))
            }
            AppsCommands::Delete { name } => Box::new(apps::DeleteCommand::new(name)),
            AppsCommands::DisableSsl => Box::new(apps::DisableSslCommand),
        },
        Commands::Projects { command } => match command {
            ProjectsCommands::List => Box::new(projects::ListCommand),
            ProjectsCommands::Add {
                name,
                parent,
                description,
            } => Box::new(projects::AddCommand::new(name, parent, description)),
            ProjectsCommands::Delete { ids } => Box::new(projects::DeleteCommand::new(ids)),
        },
        Commands::Registries { command } => match command {
            RegistriesCommands::List => Box::new(registries::ListCommand),
            RegistriesCommands::Add {
                user,
                password,
                domain,
                prefix,
                registry_type,
            } => Box::new(registries::AddCommand::new(RegistryForm::new(
                &user,
                &password,
                &domain,
                &prefix,
                registry_type,
            ))),
            RegistriesCommands::Delete { id, allow_local } => {
                Box::new(registries::DeleteCommand::new(id, allow_local))
            }
            RegistriesCommands::SetDefault { id } => {
                Box::new(registries::SetDefaultCommand::new(id))
            }
        },
    }
}
