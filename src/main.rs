// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Flowplan CLI entrypoint.
//!
//! Serves the REST API, the `/ws` push channel, and MCP over streamable HTTP
//! at `http://127.0.0.1:<port>/mcp` for one project directory. The port is
//! derived from the project path unless `--port` or `FLOWPLAN_PORT` says
//! otherwise.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};

use flowplan::api::{self, PortFile};
use flowplan::mcp::FlowplanMcp;
use flowplan::store::{FlowchartDir, FlowchartStore, WriteDurability};
use flowplan::sync::{spawn_relay, spawn_watcher, ChangeBroadcaster};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<project-dir>] [--port <port>] [--durable-writes]\n\nServes flowcharts for one project at `http://127.0.0.1:<port>` (REST under\n/api, live updates at /ws, MCP at /mcp). Documents live in\n`<project-dir>/.claude/flowplans/`.\n\nIf project-dir is omitted, the current working directory is used.\n--port bypasses per-project port derivation and probing (0 = ephemeral);\nthe FLOWPLAN_PORT environment variable overrides derivation too.\n\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    project_dir: Option<String>,
    port: Option<u16>,
    durable_writes: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" => {
                if options.port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.port = Some(port);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.project_dir.is_some() {
                    return Err(());
                }
                options.project_dir = Some(arg);
            }
        }
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "flowplan".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let project_dir = options.project_dir.unwrap_or_else(|| ".".to_owned());
        let dir = if options.durable_writes {
            FlowchartDir::new(&project_dir).with_durability(WriteDurability::Durable)
        } else {
            FlowchartDir::new(&project_dir)
        };
        let store = Arc::new(FlowchartStore::new(dir));

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        runtime.block_on(async move {
            let listener = match options.port {
                Some(port) => tokio::net::TcpListener::bind(("127.0.0.1", port)).await?,
                None => api::bind_project_port(Path::new(&project_dir)).await?,
            };
            let port = listener.local_addr()?.port();

            let port_file = serde_json::to_vec(&PortFile {
                port,
                pid: std::process::id(),
            })?;
            store.dir().write_port_file(&port_file)?;

            let broadcaster = ChangeBroadcaster::new();
            let relay = spawn_relay(store.clone(), broadcaster.clone());
            let watcher = spawn_watcher(store.clone());

            let config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let shutdown_token = config.cancellation_token.clone();

            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp = FlowplanMcp::new(store.clone(), port);
            let mcp_service =
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config);

            let router = api::router(store.clone(), broadcaster).nest_service("/mcp", mcp_service);

            eprintln!("flowplan: serving {project_dir} at http://127.0.0.1:{port}");

            let serve_shutdown = shutdown_token.clone();
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = tokio::signal::ctrl_c().await;
                    serve_shutdown.cancel();
                })
                .await?;

            shutdown_token.cancel();
            store.close();
            let _ = watcher.await;
            relay.abort();
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("flowplan: {err}");
        std::process::exit(1);
    }
}
