// Copyright 2024 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

#![doc = include_str!("../README.md")]

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tara_idcard::{
    Certificate, ConfiguredEndpointResolver, HttpTransport, IdCardConfig, OcspEndpointConfig,
    OcspError, OcspValidator, TrustedCertificates,
};

/// Check an ID-card certificate against its OCSP responders.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct CliArgs {
    /// Path to the TOML configuration file.
    #[clap(short, long, env = "TARA_IDCARD_CONFIG")]
    config: PathBuf,

    /// Path to a PEM bundle of trusted certificates. Overrides the
    /// configured truststore.
    #[clap(short, long)]
    truststore: Option<PathBuf>,

    /// Log more (-v for info, -vv for debug).
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Path to the certificate to check (PEM or DER).
    certificate: PathBuf,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // RUST_LOG, when set, takes precedence.
    let level = match args.verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(endpoint) => {
            println!("GOOD: validated by {}", endpoint.url);
            ExitCode::SUCCESS
        }
        Err(err) => match err.downcast_ref::<OcspError>() {
            Some(ocsp_error) => {
                eprintln!("{}: {ocsp_error}", ocsp_error.error_code().message());
                match ocsp_error {
                    OcspError::Revoked { .. } | OcspError::Unknown => ExitCode::from(2),
                    _ => ExitCode::FAILURE,
                }
            }
            None => {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(args: &CliArgs) -> Result<OcspEndpointConfig> {
    let mut config = IdCardConfig::from_file(&args.config)?;

    if let Some(truststore) = &args.truststore {
        config.truststore_path = truststore.clone();
    }

    let trusted = TrustedCertificates::from_pem_file(&config.truststore_path)?;
    let subject = load_certificate(&args.certificate)?;

    let validator = OcspValidator::new(
        Arc::new(trusted),
        Arc::new(ConfiguredEndpointResolver::new(&config)),
        Arc::new(HttpTransport::new()),
    );

    Ok(validator.validate_certificate(&subject)?)
}

fn load_certificate(path: &Path) -> Result<Certificate> {
    let data =
        fs::read(path).with_context(|| format!("unable to read {}", path.display()))?;

    Certificate::load(&data).with_context(|| format!("invalid certificate {}", path.display()))
}
