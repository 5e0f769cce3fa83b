//! Interactive chat with a locally running agent server.
//!
//! Run with:
//! ```bash
//! export ADK_BASE_URL="http://localhost:8000"   # optional
//! export ADK_APP_NAME="agent"                   # optional
//! cargo run --example chat
//! ```

use std::io::{BufRead, Write};

use adk_client::{AdkClient, AgentService, ApplicationEvent};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Diagnostics go to stderr, filtered by RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let client = AdkClient::from_env()?;
    let session = client.create_session().await?;
    println!("Session {} started. Type a message, Ctrl-D to quit.", session.id);

    let stdin = std::io::stdin();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let mut events = match client.send_message(&session, message).await {
            Ok(events) => events,
            Err(e) => {
                eprintln!("Error starting stream: {}", e);
                continue;
            }
        };

        while let Some(event) = events.next().await {
            match event {
                Ok(ApplicationEvent::Status { message }) => {
                    // Overwrite the previous status line
                    eprint!("\r\x1b[2K{}", message);
                }
                Ok(ApplicationEvent::Text { content }) => {
                    eprint!("\r\x1b[2K");
                    print!("{}", content);
                    std::io::stdout().flush()?;
                }
                Err(e) => {
                    eprintln!("\nError in stream: {}", e);
                    break;
                }
            }
        }
        eprint!("\r\x1b[2K");
        println!();
    }

    Ok(())
}
