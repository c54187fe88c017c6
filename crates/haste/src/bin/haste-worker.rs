// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `haste-worker` subprocess: reads one [`ExtractRequest`] per line on
//! stdin, extracts metadata with [`MarkerExtractor`], and writes one
//! [`ExtractResponse`] per line on stdout. Spawned and torn down by
//! [`haste::worker::ProcessPool`]; never invoked directly by users.

use std::io::{self, BufRead, Write};

use haste::extractor::{Extractor, MarkerExtractor};
use haste::worker::{ExtractRequest, ExtractResponse};

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("HASTE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();

    let extractor = MarkerExtractor;
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let response = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => respond(&extractor, &line),
            Err(e) => ExtractResponse::Err(format!("reading request: {e}")),
        };

        let Ok(mut encoded) = serde_json::to_string(&response) else {
            tracing::error!("failed to encode response, dropping it");
            continue;
        };
        encoded.push('\n');
        if out.write_all(encoded.as_bytes()).is_err() || out.flush().is_err() {
            break;
        }
    }
}

fn respond(extractor: &MarkerExtractor, line: &str) -> ExtractResponse {
    let request: ExtractRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => return ExtractResponse::Err(format!("decoding request: {e}")),
    };

    match extractor.extract(&request.path) {
        Ok(result) => ExtractResponse::Ok(result),
        Err(e) => ExtractResponse::Err(e.to_string()),
    }
}
