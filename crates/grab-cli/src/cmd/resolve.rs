//! Resolve command

use anyhow::{Result, bail};
use futures::future::join_all;
use grab_core::Resolver;
use grab_core::request::sanitize_message;
use grab_schema::{Resolution, Target};
use std::collections::HashMap;
use std::sync::Arc;

use crate::ResolveArgs;

/// Resolve every distinct target concurrently through one shared resolver
pub async fn resolve(args: &ResolveArgs) -> Result<()> {
    let resolver = Resolver::new()?;
    let defaults = args.defaults();

    let mut unique: Vec<&str> = Vec::new();
    for target in &args.targets {
        if !unique.contains(&target.as_str()) {
            unique.push(target);
        }
    }

    let (resolver, defaults) = (&resolver, &defaults);
    let results = join_all(unique.iter().map(|&target| async move {
        let result = match args.query_for(target, defaults) {
            Ok(query) => resolver.execute(&query).await,
            Err(e) => Err(e),
        };
        (target, result)
    }))
    .await;

    let mut outcomes: HashMap<&str, Result<Arc<Resolution>, Failure>> = HashMap::new();
    for (target, result) in results {
        let outcome = result.map_err(|e| {
            tracing::debug!(repo = %target, kind = e.kind(), "resolution failed");
            Failure {
                kind: e.kind(),
                upstream: !e.is_client_error(),
                message: sanitize_message(&e.to_string()),
            }
        });
        outcomes.insert(target, outcome);
    }

    let mut resolved: Vec<Arc<Resolution>> = Vec::new();
    let (mut failed, mut upstream) = (0usize, 0usize);
    for target in &args.targets {
        match outcomes.get(target.as_str()) {
            Some(Ok(resolution)) => resolved.push(Arc::clone(resolution)),
            Some(Err(failure)) => {
                failed += 1;
                if failure.upstream {
                    upstream += 1;
                }
                eprintln!("{target}: {} [{}]", failure.message, failure.kind);
            }
            None => {}
        }
    }

    if args.json {
        let out: Vec<&Resolution> = resolved.iter().map(AsRef::as_ref).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for resolution in &resolved {
            print_summary(resolution);
        }
    }

    if upstream > 0 {
        bail!(
            "{failed} of {} target(s) failed to resolve ({upstream} on the provider side, retrying may help)",
            args.targets.len()
        );
    }
    if failed > 0 {
        bail!("{failed} of {} target(s) failed to resolve", args.targets.len());
    }
    Ok(())
}

/// A failed target, ready to report
struct Failure {
    kind: &'static str,
    upstream: bool,
    message: String,
}

fn print_summary(r: &Resolution) {
    let lw = 10;
    let q = &r.query;
    let asset = &r.selected;

    println!();
    println!("  {}/{} {}", q.user, q.program, r.version);
    println!("  {:<lw$}{}", "asset", asset.name);
    println!("  {:<lw$}{}/{} ({})", "platform", asset.os, asset.arch, asset.file_type);
    println!("  {:<lw$}{}", "url", asset.url);
    println!("  {:<lw$}{}", "install", q.display_name());
    if q.private {
        println!("  {:<lw$}yes", "private");
    }
    println!("  {:<lw$}{} available", "assets", r.assets.len());

    if asset.is_mac() && Target::from_query(q).arch == "arm64" && !r.has_apple_silicon {
        println!("  note: no native Apple Silicon build, this asset runs under Rosetta 2");
    }
}
