// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for command line parsing.

#[cfg(test)]
mod tests {
    use crate::config::{Cli, Command, LogFormat, OutputFormat, WorkloadIdentity};
    use clap::Parser;
    use std::path::PathBuf;

    const REQUIRED: [&str; 6] = [
        "--cluster-service-ip",
        "172.30.0.10",
        "--agent-image",
        "registry.example.com/coredns:1.11",
        "--tooling-image",
        "registry.example.com/cli:1.0",
    ];

    fn parse(subcommand: &str, extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["nodedns", subcommand];
        argv.extend_from_slice(&REQUIRED);
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_render_defaults() {
        let cli = parse("render", &[]).unwrap();

        let Command::Render(args) = cli.command else {
            panic!("expected render subcommand");
        };
        assert_eq!(args.output, OutputFormat::Yaml);
        assert_eq!(args.workload.identity(), WorkloadIdentity::default());

        let inputs = args.workload.inputs();
        assert_eq!(inputs.cluster_service_ip, "172.30.0.10");
        assert_eq!(inputs.cluster_domain, "cluster.local");
        assert_eq!(inputs.agent_image, "registry.example.com/coredns:1.11");
        assert_eq!(inputs.tooling_image, "registry.example.com/cli:1.0");
    }

    #[test]
    fn test_run_overrides() {
        let cli = parse(
            "run",
            &[
                "--name",
                "dns-test",
                "--namespace",
                "test-ns",
                "--metrics-port",
                "9090",
                "--resync-secs",
                "60",
                "--log-format",
                "json",
            ],
        )
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.metrics_port, 9090);
        assert_eq!(args.resync_secs, 60);
        assert_eq!(
            args.workload.identity(),
            WorkloadIdentity::new("dns-test", "test-ns")
        );
    }

    #[test]
    fn test_check_requires_current_file() {
        assert!(parse("check", &[]).is_err());

        let cli = parse("check", &["--current", "live.yaml", "--output", "json"]).unwrap();

        let Command::Check(args) = cli.command else {
            panic!("expected check subcommand");
        };
        assert_eq!(args.current, PathBuf::from("live.yaml"));
        assert_eq!(args.output, OutputFormat::Json);
    }

    #[test]
    fn test_missing_image_is_rejected() {
        let err = Cli::try_parse_from([
            "nodedns",
            "render",
            "--cluster-service-ip",
            "172.30.0.10",
            "--agent-image",
            "registry.example.com/coredns:1.11",
        ])
        .unwrap_err();

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
