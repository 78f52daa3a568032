use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use kube_schema_resolver::GroupVersionKind;
use kube_schema_resolver_cli::{CliError, Cli, Color, LogFormat, resolve, run};
use serde_json::json;

fn parse(args: &[&str]) -> Result<Cli> {
    let argv = std::iter::once("kube-schema-resolver").chain(args.iter().copied());
    Cli::try_parse_from(argv).map_err(|e| eyre!(e.to_string()))
}

fn core_definitions() -> String {
    test_util::workspace_testdata()
        .join("definitions/core.json")
        .to_string_lossy()
        .to_string()
}

#[test]
fn cli_parses_defaults() -> Result<()> {
    let cli = parse(&["apps/v1", "Deployment"])?;

    assert_eq!(cli.gvk()?, GroupVersionKind::new("apps", "v1", "Deployment"));
    assert!(cli.output.output.is_none());
    assert!(!cli.output.compact);
    assert!(cli.source.definitions.is_none());
    assert_eq!(cli.log.color, Color::Auto);
    assert_eq!(cli.log.log_format, None);
    Ok(())
}

#[test]
fn cli_parses_log_options() -> Result<()> {
    let cli = parse(&[
        "v1",
        "Pod",
        "--log-format",
        "compact",
        "--log-level",
        "debug",
        "--color",
        "never",
    ])?;
    assert_eq!(cli.log.log_format, Some(LogFormat::PrettyCompact));
    assert_eq!(cli.log.log_level, Some(tracing::Level::DEBUG));
    assert_eq!(cli.log.color, Color::Never);
    Ok(())
}

#[test]
fn core_api_version_has_empty_group() -> Result<()> {
    let cli = parse(&["v1", "ConfigMap"])?;
    assert_eq!(cli.gvk()?, GroupVersionKind::new("", "v1", "ConfigMap"));
    Ok(())
}

#[test]
fn rejects_malformed_api_version() -> Result<()> {
    let cli = parse(&["apps/v1/extra", "Deployment", "--definitions", &core_definitions()])?;
    assert!(matches!(resolve(&cli), Err(CliError::ApiVersion(_))));
    Ok(())
}

#[test]
fn requires_a_source() -> Result<()> {
    let cli = parse(&["v1", "Pod"])?;
    if cli.source.server.is_some() {
        // KUBE_SCHEMA_SERVER is set in the environment
        return Ok(());
    }
    assert!(matches!(resolve(&cli), Err(CliError::NoSource)));
    Ok(())
}

#[test]
fn resolves_from_definitions() -> Result<()> {
    let _guard = test_util::builder().build();
    let cli = parse(&["v1", "ConfigMap", "--definitions", &core_definitions()])?;

    let schema = resolve(&cli).wrap_err("resolve ConfigMap")?;
    similar_asserts::assert_eq!(
        serde_json::to_value(&schema)?,
        json!({
            "type": "object",
            "properties": {
                "data": {
                    "type": "object",
                    "additionalProperties": {"type": "string", "default": ""}
                },
                "metadata": {
                    "type": "object",
                    "properties": {
                        "labels": {
                            "type": "object",
                            "additionalProperties": {"type": "string", "default": ""}
                        },
                        "name": {"type": "string"}
                    }
                }
            },
            "x-kubernetes-group-version-kind": [
                {"group": "", "kind": "ConfigMap", "version": "v1"}
            ]
        })
    );
    Ok(())
}

#[test]
fn unknown_kind_names_the_gvk() -> Result<()> {
    let cli = parse(&["apps/v1", "Deployment", "--definitions", &core_definitions()])?;
    let err = resolve(&cli).expect_err("deployment is not a core definition");
    assert!(matches!(&err, CliError::Resolve(e) if e.is_not_found()));
    assert!(err.to_string().contains("apps/v1, Kind=Deployment"));
    Ok(())
}

#[test]
fn writes_output_file() -> Result<()> {
    let dir = tempfile::tempdir().wrap_err("tempdir")?;
    let out = dir.path().join("nested").join("pod.json");
    let out_str = out.to_string_lossy().to_string();

    let cli = parse(&[
        "v1",
        "Pod",
        "--definitions",
        &core_definitions(),
        "--compact",
        "-o",
        &out_str,
    ])?;
    run(&cli).wrap_err("run")?;

    let written = std::fs::read_to_string(&out).wrap_err("read output")?;
    assert!(!written.contains('\n'));
    let schema: serde_json::Value = serde_json::from_str(&written)?;
    assert_eq!(
        schema.pointer("/properties/spec/properties/containers/items/required"),
        Some(&json!(["name"]))
    );
    assert!(!written.contains("$ref"));
    Ok(())
}

#[test]
fn cli_parses_tls_options() -> Result<()> {
    let cli = parse(&[
        "v1",
        "Pod",
        "--server",
        "https://kube.local:6443",
        "--certificate-authority",
        "/etc/kubernetes/pki/ca.crt",
        "--insecure-skip-tls-verify",
    ])?;
    let opts = cli.resolver_options();
    assert_eq!(
        opts.certificate_authority.as_deref(),
        Some(std::path::Path::new("/etc/kubernetes/pki/ca.crt"))
    );
    assert!(opts.insecure_skip_tls_verify);
    assert_eq!(opts.server.as_deref(), Some("https://kube.local:6443"));
    Ok(())
}
