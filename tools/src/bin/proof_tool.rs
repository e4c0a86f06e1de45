//! Offline operator tool for the file-proof protocol.
//!
//! Everything here runs locally: no chain access, no network. Output is JSON
//! on stdout so it can be piped into submission scripts.
//!
//! # Commands
//!
//! - `gen-srs`: write a development reference string (known secret, never
//!   use in production)
//! - `pack`: show how a file is packed into field elements
//! - `commit`: commit to a file, printing contract limbs
//! - `open`: open a file commitment at a challenge point and self-verify
//! - `credential-hash` / `sign-credential`: build and sign a storage credential
//! - `setting-hash` / `sign-setting`: build and sign a setting change
//!
//! # Example Usage
//!
//! ```bash
//! proof-tool gen-srs --size 4096 --output dev.srs
//! proof-tool commit --srs dev.srs --input data.bin
//! proof-tool open --srs dev.srs --input data.bin --point 0x1234...
//! proof-tool sign-credential --key-file submitter.key \
//!     --verifier 0x... --signer 0x... --commitment 0x... \
//!     --size 300 --start 1700000000 --end 1800000000
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use common::{
    Address, Hash, REQUIRED_SIGNATURES, SettingChangeAuthorization, SettingInfo, U256, address_of,
    credential_hash, setting_change_hash, sign_hash, verify_authorization,
};
use k256::ecdsa::SigningKey;
use pos_kzg::codec::{
    decode_g1_bytes, decode_g2_bytes, encode_g1, encode_g2, encode_scalar,
    scalar_from_be_bytes_mod_order,
};
use pos_kzg::{FileCommitment, ProofInfo, Srs, element_count, pack, verify};
use serde::Serialize;
use tracing::{debug, info, warn};

// ============================================================================
// CLI Configuration
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "proof-tool", author, version, about)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an insecure reference string for development networks
    GenSrs {
        /// Number of G1 powers
        #[arg(long, default_value_t = 4096)]
        size: usize,

        /// Trapdoor; anyone who knows it can forge proofs
        #[arg(long, env = "PROOF_SRS_SECRET", default_value_t = 985)]
        secret: u64,

        #[arg(long)]
        output: PathBuf,
    },

    /// Pack a file into scalar field elements
    Pack {
        #[arg(long)]
        input: PathBuf,

        /// Print every element, not just the counts
        #[arg(long, default_value = "false")]
        elements: bool,
    },

    /// Commit to a file
    Commit {
        #[arg(long, env = "PROOF_SRS")]
        srs: PathBuf,

        #[arg(long)]
        input: PathBuf,
    },

    /// Open a file commitment at a challenge point
    Open {
        #[arg(long, env = "PROOF_SRS")]
        srs: PathBuf,

        #[arg(long)]
        input: PathBuf,

        /// 32-byte big-endian challenge value, reduced modulo r
        #[arg(long)]
        point: String,
    },

    /// Hash a storage credential
    CredentialHash {
        #[command(flatten)]
        credential: CredentialArgs,
    },

    /// Hash and sign a storage credential
    SignCredential {
        #[command(flatten)]
        credential: CredentialArgs,

        /// File holding the submitter's hex-encoded secp256k1 key
        #[arg(long, env = "PROOF_KEY_FILE")]
        key_file: PathBuf,
    },

    /// Hash a setting change at a given authorization nonce
    SettingHash {
        #[command(flatten)]
        setting: SettingArgs,
    },

    /// Sign a setting change with all five authorized keys
    SignSetting {
        #[command(flatten)]
        setting: SettingArgs,

        /// Files holding the authorized keys, one per signer
        #[arg(long = "key-file", num_args = 1.., required = true)]
        key_files: Vec<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct CredentialArgs {
    /// Proof contract the credential is bound to
    #[arg(long)]
    verifier: Address,

    /// Account that will add the file
    #[arg(long)]
    signer: Address,

    /// Commitment as a hex 128-byte limb buffer
    #[arg(long)]
    commitment: String,

    /// File size in bytes
    #[arg(long)]
    size: u64,

    /// Start of the storage period (unix seconds)
    #[arg(long)]
    start: u64,

    /// End of the storage period (unix seconds)
    #[arg(long)]
    end: u64,
}

#[derive(clap::Args, Debug)]
struct SettingArgs {
    /// Proof controller contract
    #[arg(long)]
    controller: Address,

    /// Authorization contract holding the nonce
    #[arg(long)]
    auth: Address,

    /// TOML file with the full settings record
    #[arg(long)]
    settings: PathBuf,

    /// New verification key as a hex 256-byte limb buffer
    #[arg(long)]
    vk: String,

    /// Current authorization nonce
    #[arg(long)]
    nonce: u64,
}

// ============================================================================
// Output Types
// ============================================================================

#[derive(Serialize)]
struct PackOutput {
    size: usize,
    shards: usize,
    element_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    elements: Option<Vec<String>>,
}

#[derive(Serialize)]
struct CommitOutput {
    size: u64,
    element_count: usize,
    /// Flattened contract limbs, the form `add-file` and warden files use
    commitment: String,
    limbs: Vec<String>,
}

#[derive(Serialize)]
struct OpenOutput {
    point: String,
    commitment: String,
    witness: Vec<String>,
    claimed_value: String,
    verified: bool,
}

#[derive(Serialize)]
struct HashOutput {
    hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signer: Option<Address>,
}

// ============================================================================
// Helpers
// ============================================================================

fn hex_prefixed(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn parse_hex(value: &str, what: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim().strip_prefix("0x").unwrap_or(value.trim()))
        .with_context(|| format!("{what} is not valid hex"))
}

fn parse_hash(value: &str) -> Result<[u8; 32]> {
    let bytes = parse_hex(value, "point")?;
    if bytes.len() > 32 {
        bail!("point must be at most 32 bytes, got {}", bytes.len());
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

fn read_srs(path: &Path) -> Result<Srs> {
    let file = File::open(path).with_context(|| format!("Failed to open SRS {}", path.display()))?;
    let srs = Srs::read_from(BufReader::new(file))
        .with_context(|| format!("Failed to decode SRS {}", path.display()))?;
    debug!(powers = srs.len(), path = %path.display(), "Loaded SRS");
    Ok(srs)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Load a secp256k1 key from a file holding its hex encoding.
fn read_key(path: &Path) -> Result<SigningKey> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = std::fs::metadata(path) {
            let mode = meta.permissions().mode() & 0o777;
            if mode & 0o077 != 0 {
                warn!(
                    path = %path.display(),
                    mode = %format!("{mode:o}"),
                    "Key file is readable by other users, consider chmod 600"
                );
            }
        }
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    let bytes = parse_hex(&contents, "key")?;
    SigningKey::from_slice(&bytes).map_err(|e| anyhow!("invalid secp256k1 key: {e}"))
}

fn credential(args: &CredentialArgs) -> Result<Hash> {
    let commitment = decode_g1_bytes(&parse_hex(&args.commitment, "commitment")?)
        .context("Invalid commitment")?;
    Ok(credential_hash(
        &args.verifier,
        &args.signer,
        &commitment,
        args.size,
        &U256::from(args.start),
        &U256::from(args.end),
    ))
}

fn setting(args: &SettingArgs) -> Result<(Hash, U256)> {
    let text = std::fs::read_to_string(&args.settings)
        .with_context(|| format!("Failed to read {}", args.settings.display()))?;
    let info: SettingInfo = toml::from_str(&text).context("Invalid settings record")?;
    let vk = decode_g2_bytes(&parse_hex(&args.vk, "vk")?).context("Invalid verification key")?;
    let nonce = U256::from(args.nonce);
    Ok((
        setting_change_hash(&args.controller, &args.auth, &info, &vk, &nonce),
        nonce,
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.cmd {
        Command::GenSrs {
            size,
            secret,
            output,
        } => {
            warn!(secret, "Generating SRS from a known secret, for development only");
            let srs = Srs::insecure(size, secret)?;
            let file = File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            srs.write_to(BufWriter::new(file))?;
            info!(size, path = %output.display(), "SRS written");
            print_json(&serde_json::json!({
                "size": size,
                "vk": hex_prefixed(encode_g2(&srs.verifying_key()).concat()),
            }))
        }

        Command::Pack { input, elements } => {
            let data = read_input(&input)?;
            let packed = pack(&data);
            print_json(&PackOutput {
                size: data.len(),
                shards: packed.len() / pos_kzg::ELEMENTS_PER_SHARD,
                element_count: element_count(data.len()),
                elements: elements
                    .then(|| packed.iter().map(|e| hex_prefixed(encode_scalar(e))).collect()),
            })
        }

        Command::Commit { srs, input } => {
            let srs = read_srs(&srs)?;
            let data = read_input(&input)?;
            let file = FileCommitment::generate(&srs, &data)
                .with_context(|| format!("Failed to commit to {}", input.display()))?;
            info!(size = file.size, elements = file.element_count(), "Committed file");
            let limbs = file.limbs();
            print_json(&CommitOutput {
                size: file.size,
                element_count: file.element_count(),
                commitment: hex_prefixed(limbs.concat()),
                limbs: limbs.iter().map(hex_prefixed).collect(),
            })
        }

        Command::Open { srs, input, point } => {
            let srs = read_srs(&srs)?;
            let data = read_input(&input)?;
            let raw = parse_hash(&point)?;
            let z = scalar_from_be_bytes_mod_order(&raw);

            let file = FileCommitment::generate(&srs, &data)?;
            let proof = file.open(&srs, z)?;
            let verified = verify(&srs, &file.commitment, z, &proof);
            if !verified {
                warn!("Opening failed local verification");
            }

            let info = ProofInfo::from_opening(&proof);
            print_json(&OpenOutput {
                point: hex_prefixed(encode_scalar(&z)),
                commitment: hex_prefixed(encode_g1(&file.commitment).concat()),
                witness: info.npsi.iter().map(hex_prefixed).collect(),
                claimed_value: hex_prefixed(info.y),
                verified,
            })
        }

        Command::CredentialHash { credential: args } => {
            let hash = credential(&args)?;
            print_json(&HashOutput {
                hash: hex_prefixed(hash),
                signature: None,
                signer: None,
            })
        }

        Command::SignCredential {
            credential: args,
            key_file,
        } => {
            let hash = credential(&args)?;
            let key = read_key(&key_file)?;
            let signature = sign_hash(&key, &hash)?;
            print_json(&HashOutput {
                hash: hex_prefixed(hash),
                signature: Some(signature.to_string()),
                signer: Some(address_of(key.verifying_key())),
            })
        }

        Command::SettingHash { setting: args } => {
            let (hash, nonce) = setting(&args)?;
            print_json(&serde_json::json!({
                "hash": hex_prefixed(hash),
                "nonce": nonce,
            }))
        }

        Command::SignSetting {
            setting: args,
            key_files,
        } => {
            if key_files.len() != REQUIRED_SIGNATURES {
                bail!(
                    "setting changes need exactly {} keys, got {}",
                    REQUIRED_SIGNATURES,
                    key_files.len()
                );
            }
            let keys = key_files
                .iter()
                .map(|path| read_key(path))
                .collect::<Result<Vec<_>>>()?;
            let signers: Vec<Address> = keys.iter().map(|k| address_of(k.verifying_key())).collect();

            let (hash, nonce) = setting(&args)?;
            let refs: [&SigningKey; REQUIRED_SIGNATURES] = std::array::from_fn(|i| &keys[i]);
            let authorization = SettingChangeAuthorization::sign(hash, nonce, refs)?;
            verify_authorization(&hash, &authorization, &signers)
                .context("Keys do not form a valid authorization")?;

            print_json(&authorization)
        }
    }
}
