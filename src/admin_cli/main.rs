use ad_agency::database::{self, models::UserRole, schema};
use ad_agency::services::accounts::{self, NewUser};
use clap::{Parser, Subcommand, ValueEnum};

/// Command-line utility for administering the ad agency back office.
/// Creates and wipes the schema, inspects tables and opens accounts.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, verbatim_doc_comment)]
struct Cli {
    /// Overrides DATABASE_URL.
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        db_command: DbCommand,
    },
    /// Account management.
    User {
        #[command(subcommand)]
        user_command: UserCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Creates every missing table from the entity definitions.
    Init,
    /// Drops ALL application tables. Use with care!
    Wipe {
        /// Skip the confirmation guard.
        #[arg(long)]
        yes: bool,
    },
    /// Runs a SELECT against a table and prints the rows as JSON.
    Query {
        /// Table name.
        #[arg(short, long)]
        table: String,

        /// WHERE condition (e.g. "status = 'unpaid'").
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Admin,
    Manager,
    Accountant,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => UserRole::Admin,
            RoleArg::Manager => UserRole::Manager,
            RoleArg::Accountant => UserRole::Accountant,
        }
    }
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Creates an account; `--superuser` grants full access.
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        tel: Option<String>,
        #[arg(long, value_enum)]
        role: RoleArg,
        #[arg(long)]
        superuser: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));
    let cli = Cli::parse();
    let db = match cli.database_url.as_deref() {
        Some(url) => database::connect_from_url(url).await?,
        None => database::connect().await?,
    };

    match cli.command {
        Commands::Db { db_command } => match db_command {
            DbCommand::Init => {
                schema::create_all(&db).await?;
                println!("Schema ready: {}", schema::table_names().join(", "));
            }
            DbCommand::Wipe { yes } => {
                if !yes {
                    return Err("Refusing to wipe without --yes".into());
                }
                schema::drop_all(&db).await?;
                println!("All tables dropped.");
            }
            DbCommand::Query { table, filter } => {
                let rows = schema::dump_table(&db, &table, filter.as_deref()).await?;
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
        },
        Commands::User { user_command } => match user_command {
            UserCommand::Create {
                username,
                password,
                email,
                first_name,
                last_name,
                tel,
                role,
                superuser,
            } => {
                let user = accounts::create_user(
                    &db,
                    NewUser {
                        username,
                        password,
                        first_name,
                        last_name,
                        email,
                        tel,
                        role: role.into(),
                        is_staff: superuser,
                        is_superuser: superuser,
                    },
                )
                .await?;
                println!("Created user {} (id {})", user, user.id);
            }
        },
    }

    Ok(())
}
