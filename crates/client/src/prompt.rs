// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal implementation of the session-expired prompt.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::session::coordinator::{PromptChoice, PromptRequest};

/// Answer session-expired prompts on stdin/stdout.
///
/// `y`/`yes` continues the session; anything else (including EOF) logs
/// out. Runs until the coordinator drops the sender.
pub fn spawn_terminal_prompt(mut rx: mpsc::Receiver<PromptRequest>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(req) = rx.recv().await {
            eprintln!("Your session has expired. Continue? [y/N]");
            let mut line = String::new();
            let mut reader = BufReader::new(tokio::io::stdin());
            let choice = match reader.read_line(&mut line).await {
                Ok(n) if n > 0 => match line.trim().to_lowercase().as_str() {
                    "y" | "yes" => PromptChoice::Continue,
                    _ => PromptChoice::LogOut,
                },
                _ => PromptChoice::LogOut,
            };
            let _ = req.reply.send(choice);
        }
    })
}
