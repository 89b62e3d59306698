//! Stdio transport: newline-delimited JSON-RPC on stdin/stdout.
//!
//! Stdout carries protocol messages only; logs must go to stderr.

use std::sync::Arc;

use {
    tokio::{
        io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
        sync::mpsc,
        task::JoinSet,
    },
    tracing::{debug, info, trace, warn},
};

use crate::{error::Result, server::McpServer};

const TRANSPORT: &str = "stdio";

/// Serve the process's own stdin/stdout until stdin closes.
pub async fn serve_stdio(server: Arc<McpServer>) -> Result<()> {
    info!("serving MCP over stdio");
    serve(server, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Read requests line by line from `reader` and write responses to `writer`.
///
/// Requests are handled concurrently, so responses may come back out of
/// order; clients match them by id. Returns once the reader hits EOF and
/// every in-flight request has been answered.
pub async fn serve<R, W>(server: Arc<McpServer>, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let read_loop = async move {
        let mut lines = BufReader::new(reader).lines();
        let mut in_flight = JoinSet::new();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    trace!(raw = %line, "client -> server");

                    reap_finished(&mut in_flight);

                    let server = Arc::clone(&server);
                    let tx = tx.clone();
                    in_flight.spawn(async move {
                        let Some(response) = server.handle_raw(&line, TRANSPORT).await else {
                            return;
                        };
                        match serde_json::to_string(&response) {
                            Ok(out) => {
                                let _ = tx.send(out);
                            },
                            Err(e) => warn!(error = %e, "failed to serialize response"),
                        }
                    });
                },
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "error reading from stdin");
                    break;
                },
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "request task failed");
            }
        }
        // Dropping the last sender ends the write loop.
        drop(tx);
    };

    let write_loop = async move {
        while let Some(out) = rx.recv().await {
            trace!(raw = %out, "server -> client");
            writer.write_all(out.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    };

    let ((), written) = tokio::join!(read_loop, write_loop);
    written?;
    info!("stdio transport finished");
    Ok(())
}

/// Drop handles of requests that already completed so a long session does
/// not accumulate them. Returns how many were collected.
fn reap_finished(in_flight: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(joined) = in_flight.try_join_next() {
        if let Err(e) = joined {
            warn!(error = %e, "request task failed");
        }
        reaped += 1;
    }
    reaped
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            registry::ToolHost,
            router::ToolRouter,
            tool::{ToolDescriptor, ToolHandler},
            types::{ServerInfo, ToolsCallResult},
        },
        async_trait::async_trait,
        serde_json::{Value, json},
    };

    struct Upper;

    #[async_trait]
    impl ToolHandler for Upper {
        async fn call(&self, arguments: Value) -> Result<ToolsCallResult> {
            Ok(ToolsCallResult::text(
                arguments["s"].as_str().unwrap_or_default().to_uppercase(),
            ))
        }
    }

    fn server() -> Arc<McpServer> {
        let router = Arc::new(ToolRouter::new());
        router
            .register(
                ToolDescriptor::new("upper", "", json!({"type": "object"}), Arc::new(Upper))
                    .validate()
                    .unwrap(),
            )
            .unwrap();
        Arc::new(McpServer::new(router, ServerInfo {
            name: "bol-mcp".into(),
            version: "test".into(),
        }))
    }

    #[tokio::test]
    async fn answers_each_request_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"upper","arguments":{"s":"bol"}}}"#,
            "\n",
        );
        let mut output = Vec::new();
        serve(server(), input.as_bytes(), &mut output).await.unwrap();

        let mut responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        responses.sort_by_key(|r| r["id"].as_i64());

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"], json!({}));
        assert_eq!(responses[1]["result"]["content"][0]["text"], "BOL");
    }

    #[tokio::test]
    async fn finished_requests_are_reaped() {
        let mut in_flight = JoinSet::new();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        for _ in 0..3 {
            let done_tx = done_tx.clone();
            in_flight.spawn(async move {
                let _ = done_tx.send(());
            });
        }
        let (_hold, wait) = tokio::sync::oneshot::channel::<()>();
        in_flight.spawn(async move {
            let _ = wait.await;
        });

        for _ in 0..3 {
            done_rx.recv().await.unwrap();
        }
        // The senders ran to completion; give the runtime a moment to mark
        // their tasks finished.
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while in_flight.len() > 1 {
                reap_finished(&mut in_flight);
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(in_flight.len(), 1);
        assert_eq!(reap_finished(&mut in_flight), 0);
    }

    #[tokio::test]
    async fn long_session_answers_every_request() {
        let input: String = (1..=200)
            .map(|id| format!("{{\"jsonrpc\":\"2.0\",\"id\":{id},\"method\":\"ping\"}}\n"))
            .collect();
        let mut output = Vec::new();
        serve(server(), input.as_bytes(), &mut output).await.unwrap();

        let mut ids: Vec<i64> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["id"].as_i64().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=200).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn garbage_line_gets_parse_error() {
        let mut output = Vec::new();
        serve(server(), "hello\n".as_bytes(), &mut output)
            .await
            .unwrap();
        let resp: Value = serde_json::from_slice(output.trim_ascii()).unwrap();
        assert_eq!(resp["error"]["code"], -32700);
    }
}
