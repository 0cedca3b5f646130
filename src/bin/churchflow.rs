use clap::{Parser, Subcommand};

use churchflow_api::{config, database, server};

#[derive(Parser)]
#[command(name = "churchflow")]
#[command(about = "ChurchFlow CLI - operations tooling for the ChurchFlow API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the API server")]
    Serve {
        #[arg(long, help = "Port to bind (defaults to config/PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Report which required/optional environment variables are set")]
    CheckEnv,

    #[command(about = "Print a bcrypt hash for a password (for manual seeding)")]
    HashPassword { password: String },

    #[command(about = "Create a superadmin account")]
    SeedAdmin {
        email: String,
        password: String,
        #[arg(long, default_value = "Administrator")]
        full_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| config::config().server.port);
            server::serve(port).await
        }
        Commands::CheckEnv => check_env(),
        Commands::HashPassword { password } => {
            let hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;
            println!("{}", hash);
            Ok(())
        }
        Commands::SeedAdmin {
            email,
            password,
            full_name,
        } => seed_admin(&email, &password, &full_name).await,
    }
}

/// Presence report for the environment the service reads. Values are never
/// printed.
fn check_env() -> anyhow::Result<()> {
    const REQUIRED: &[&str] = &["DATABASE_URL", "JWT_SECRET"];
    const OPTIONAL: &[&str] = &[
        "APP_ENV",
        "PORT",
        "SMTP_HOST",
        "SMTP_PORT",
        "SMTP_USERNAME",
        "SMTP_PASSWORD",
        "SMTP_FROM",
        "SMS_GATEWAY_URL",
        "SMS_API_KEY",
        "STORAGE_ENDPOINT",
        "STORAGE_BUCKET",
        "STORAGE_API_KEY",
        "API_ENABLE_RATE_LIMITING",
        "SECURITY_CORS_ORIGINS",
    ];

    let mut missing_required = false;
    for var in REQUIRED {
        let set = std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false);
        if !set {
            missing_required = true;
        }
        println!("{:<28} {}", var, if set { "set" } else { "MISSING (required)" });
    }
    for var in OPTIONAL {
        let set = std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false);
        println!("{:<28} {}", var, if set { "set" } else { "not set" });
    }

    if missing_required {
        anyhow::bail!("required environment variables are missing");
    }
    println!("Environment looks complete.");
    Ok(())
}

async fn seed_admin(email: &str, password: &str, full_name: &str) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let pool = database::manager::pool().await?;
    let inserted: Option<uuid::Uuid> = sqlx::query_scalar(
        "INSERT INTO users (email, password_hash, full_name, role, is_active) \
         VALUES ($1, $2, $3, 'superadmin', TRUE) \
         ON CONFLICT (email) DO NOTHING RETURNING id",
    )
    .bind(&email)
    .bind(&hash)
    .bind(full_name)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(id) => println!("Created superadmin {} ({})", email, id),
        None => println!("User {} already exists, nothing to do", email),
    }
    Ok(())
}
