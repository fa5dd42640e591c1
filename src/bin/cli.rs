use sqlx::Row;
use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use thesis_portal::authz::{Role, DIVISION_HEAD};
use thesis_portal::utils::{hash_password, utc_now};

#[derive(Parser, Debug)]
#[command(author, version, about = "thesis-portal administration tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Create an active student account
    CreateStudent {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
    },
    /// Create an active faculty account with basic roles
    CreateFaculty {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        /// Basic role, repeatable (e.g. --role LECTURER --role DEAN)
        #[arg(long = "role")]
        roles: Vec<Role>,
        /// Name of a division this member heads; created when missing
        #[arg(long)]
        head_of: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD, then the crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::CreateStudent {
            email,
            password,
            name,
            code,
        } => {
            let pool = get_pool().await?;
            let id = create_student(&pool, &email, &password, &name, &code).await?;
            println!("Created student {} ({})", email, id);
        }
        Commands::CreateFaculty {
            email,
            password,
            name,
            code,
            roles,
            head_of,
        } => {
            let pool = get_pool().await?;
            let id = create_faculty(&pool, &email, &password, &name, &code, &roles, head_of.as_deref()).await?;
            println!("Created faculty member {} ({})", email, id);
        }
    }

    Ok(())
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let options = database_url
        .parse::<SqliteConnectOptions>()
        .context("invalid DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("failed to connect to database")
}

async fn create_student(pool: &SqlitePool, email: &str, password: &str, name: &str, code: &str) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();
    let password_hash = hash_password(password)?;

    sqlx::query(
        "INSERT INTO students (id, student_code, full_name, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(code)
    .bind(name)
    .bind(email.to_lowercase())
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("failed to insert student")?;

    Ok(id)
}

async fn create_faculty(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    name: &str,
    code: &str,
    roles: &[Role],
    head_of: Option<&str>,
) -> anyhow::Result<Uuid> {
    if roles.contains(&Role::Head) {
        anyhow::bail!("HEAD is derived from division membership; use --head-of instead");
    }

    let id = Uuid::new_v4();
    let now = utc_now();
    let password_hash = hash_password(password)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO faculty_members (id, faculty_code, full_name, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(code)
    .bind(name)
    .bind(email.to_lowercase())
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("failed to insert faculty member")?;

    let roles: HashSet<Role> = roles.iter().copied().collect();
    for role in roles {
        sqlx::query("INSERT INTO faculty_member_roles (faculty_member_id, role) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;
    }

    if let Some(division) = head_of {
        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM divisions WHERE name = ?")
            .bind(division)
            .fetch_optional(&mut *tx)
            .await?;

        let division_id = match existing {
            Some(division_id) => division_id,
            None => {
                let division_id = Uuid::new_v4().to_string();
                sqlx::query("INSERT INTO divisions (id, name, created_at) VALUES (?, ?, ?)")
                    .bind(&division_id)
                    .bind(division)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                division_id
            }
        };

        sqlx::query("INSERT INTO division_memberships (division_id, faculty_member_id, role) VALUES (?, ?, ?)")
            .bind(division_id)
            .bind(id.to_string())
            .bind(DIVISION_HEAD)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(id)
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let table: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
            .fetch_optional(pool)
            .await?;
    let applied_versions: HashSet<i64> = if table.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let version = migration.version;
        let status = if applied_versions.contains(&version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, version, name);
    }

    Ok(())
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Local ./migrations first, then the crate-local folder.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
