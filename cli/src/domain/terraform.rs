//! Terraform argument construction and output classification.
//!
//! Pure functions: options in, argument vectors out.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use tfcheck_common::ProvisioningOptions;

/// `terraform init` arguments.
#[must_use]
pub fn init_args(opts: &ProvisioningOptions) -> Vec<String> {
    let mut args = vec![chdir(opts), "init".to_string(), "-input=false".to_string()];
    if opts.no_color {
        args.push("-no-color".to_string());
    }
    args
}

/// `terraform apply` arguments: non-interactive, unlocked, with every var.
#[must_use]
pub fn apply_args(opts: &ProvisioningOptions) -> Vec<String> {
    converge_args(opts, "apply")
}

/// `terraform destroy` arguments. Vars are repeated because terraform
/// re-evaluates the configuration before destroying.
#[must_use]
pub fn destroy_args(opts: &ProvisioningOptions) -> Vec<String> {
    converge_args(opts, "destroy")
}

/// `terraform output -raw <key>` arguments.
#[must_use]
pub fn output_args(opts: &ProvisioningOptions, key: &str) -> Vec<String> {
    vec![
        chdir(opts),
        "output".to_string(),
        "-no-color".to_string(),
        "-raw".to_string(),
        key.to_string(),
    ]
}

fn chdir(opts: &ProvisioningOptions) -> String {
    format!("-chdir={}", opts.terraform_dir.display())
}

fn converge_args(opts: &ProvisioningOptions, command: &str) -> Vec<String> {
    let mut args = vec![
        chdir(opts),
        command.to_string(),
        "-input=false".to_string(),
        "-auto-approve".to_string(),
        "-lock=false".to_string(),
    ];
    if opts.no_color {
        args.push("-no-color".to_string());
    }
    for file in &opts.var_files {
        args.push(format!("-var-file={}", file.display()));
    }
    for (name, value) in &opts.vars {
        args.push("-var".to_string());
        args.push(format!("{name}={}", format_var_value(value)));
    }
    args
}

/// Render a variable the way terraform parses `-var` values.
///
/// Strings pass through verbatim; everything else is emitted as JSON, which
/// is also valid HCL for lists, maps, numbers, bools and null.
#[must_use]
pub fn format_var_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether terraform's stderr says the requested output does not exist.
#[must_use]
pub fn is_missing_output(stderr: &str) -> bool {
    stderr.contains("could not be found in the state file")
        || (stderr.contains("Output \"") && stderr.contains("not found"))
        || stderr.contains("No outputs found")
}

/// Description of the first retryable pattern matching `output`, if any.
///
/// # Errors
///
/// Returns an error if one of the patterns is not a valid regex.
pub fn retryable_reason(output: &str, patterns: &BTreeMap<String, String>) -> Result<Option<String>> {
    for (pattern, description) in patterns {
        let re = Regex::new(pattern)
            .with_context(|| format!("invalid retryable error pattern {pattern:?}"))?;
        if re.is_match(output) {
            return Ok(Some(description.clone()));
        }
    }
    Ok(None)
}
