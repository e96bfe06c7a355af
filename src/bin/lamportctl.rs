//! lamportctl - Lamport key, signature and forgery tool

use clap::{Parser, Subcommand};
use colored::Colorize;
use lamport_forge::forge::{ForgeConfig, ForgeJob, Forger};
use lamport_forge::lamport::{generate_keypair, keyfile, sign, verify, Message};
use lamport_forge::{forge::ForgeError, Result};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "lamportctl")]
#[command(about = "Lamport one-time signature and key-reuse forgery tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key pair
    Keygen {
        /// Secret key output file
        #[arg(long)]
        secret: PathBuf,

        /// Public key output file
        #[arg(long)]
        public: PathBuf,
    },

    /// Sign the SHA-256 digest of a text message
    Sign {
        /// Secret key file
        #[arg(long)]
        secret: PathBuf,

        /// Message text
        #[arg(long)]
        message: String,

        /// Signature output file (printed as hex if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Verify a signature over a text message
    Verify {
        /// Public key file
        #[arg(long)]
        public: PathBuf,

        /// Message text
        #[arg(long)]
        message: String,

        /// Signature file
        #[arg(long)]
        signature: PathBuf,
    },

    /// Forge a signature from reused-key signatures
    Forge {
        /// JSON job: public key, payload and signed messages
        #[arg(long)]
        job: PathBuf,

        /// JSON engine configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Worker threads (default: one per CPU)
        #[arg(long)]
        workers: Option<usize>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Forgery output file (JSON)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when a verification fails
fn run(command: Commands) -> Result<bool> {
    match command {
        Commands::Keygen { secret, public } => {
            let (secret_key, public_key) = generate_keypair()?;
            keyfile::write_secret_key(&secret, &secret_key)?;
            keyfile::write_public_key(&public, &public_key)?;

            println!("{}", "Generated Lamport key pair".green().bold());
            println!("   Secret key: {}", secret.display());
            println!("   Public key: {}", public.display());
            println!("{}", "Sign at most one message with this key.".yellow());
        }

        Commands::Sign { secret, message, out } => {
            let secret_key = keyfile::read_secret_key(&secret)?;
            let digest = Message::from_text(&message);
            let signature = sign(&digest, &secret_key);

            match out {
                Some(path) => {
                    keyfile::write_signature(&path, &signature)?;
                    println!("{}", "Signed".green().bold());
                    println!("   Digest: {}", digest.to_hex());
                    println!("   Signature: {}", path.display());
                }
                None => println!("{}", signature.to_hex()),
            }
        }

        Commands::Verify { public, message, signature } => {
            let public_key = keyfile::read_public_key(&public)?;
            let signature = keyfile::read_signature(&signature)?;
            let digest = Message::from_text(&message);

            if verify(&digest, &public_key, &signature) {
                println!("{}", "VALID".green().bold());
            } else {
                println!("{}", "INVALID".red().bold());
                return Ok(false);
            }
        }

        Commands::Forge { job, config, workers, timeout_secs, out } => {
            let job = ForgeJob::from_file(&job)?;
            let mut config = match config {
                Some(path) => ForgeConfig::from_file(path)?,
                None => ForgeConfig::default(),
            };
            if let Some(workers) = workers {
                config = config.with_workers(workers);
            }
            if let Some(secs) = timeout_secs {
                config = config.with_deadline(Duration::from_secs(secs));
            }

            println!(
                "{} {} signatures, {} workers",
                "Forging from".cyan().bold(),
                job.signatures.len(),
                config.worker_count()
            );

            let forger = Forger::new(job.public_key, config);
            let forgery = forger.forge(job.payload.as_bytes(), &job.signatures)?;

            println!("{}", "Forgery found".green().bold());
            println!("   Attempts: {}", forgery.attempts);
            println!("   Digest: {}", forgery.digest.to_hex());
            println!("   Message: {}", String::from_utf8_lossy(&forgery.message).escape_debug());

            if let Some(path) = out {
                let json = serde_json::to_string_pretty(&forgery)
                    .map_err(|e| ForgeError::Io(e.to_string()))?;
                keyfile::write_atomic(&path, &json)?;
                println!("   Saved: {}", path.display());
            }
        }

        Commands::Version => {
            println!("lamportctl v{}", lamport_forge::VERSION);
            println!("Lamport one-time signatures over SHA-256");
            println!("\nComponents:");
            println!("  • lamport: keygen, sign, verify, key files");
            println!("  • forge: harvest, coverage, parallel search");
        }
    }

    Ok(true)
}
