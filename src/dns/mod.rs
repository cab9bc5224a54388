//! DNS record gathering.
//!
//! Queries TXT, MX, NS, SOA, and CNAME records for the registrable domain of
//! the target host against a rotating list of public resolvers. Each record
//! type fans out concurrently; within a type, resolvers are tried in order
//! with a per-query timeout and the first resolver to answer wins.

use std::collections::HashMap;
use std::net::IpAddr;

use anyhow::anyhow;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;
use log::debug;
use psl::Psl;

use crate::config::{DNS_QUERY_TIMEOUT, PUBLIC_DNS_RESOLVERS};

/// The record types consulted for DNS-based fingerprints.
pub(crate) const DNS_RECORD_TYPES: [RecordType; 5] = [
    RecordType::TXT,
    RecordType::MX,
    RecordType::NS,
    RecordType::SOA,
    RecordType::CNAME,
];

/// Builds one resolver per public DNS server, with aggressive timeouts so a
/// slow resolver hands over to the next one quickly.
pub(crate) fn build_resolvers() -> Vec<TokioAsyncResolver> {
    PUBLIC_DNS_RESOLVERS
        .iter()
        .filter_map(|addr| addr.parse::<IpAddr>().ok())
        .map(|ip| {
            let group = NameServerConfigGroup::from_ips_clear(&[ip], 53, true);
            let config = ResolverConfig::from_parts(None, vec![], group);
            let mut opts = ResolverOpts::default();
            opts.timeout = DNS_QUERY_TIMEOUT;
            opts.attempts = 1;
            // Prevent search-domain appending; we always query absolute names.
            opts.ndots = 0;
            TokioAsyncResolver::tokio(config, opts)
        })
        .collect()
}

/// Extracts the registrable domain from a host using the Public Suffix List,
/// falling back to the host itself when no registrable domain exists.
pub(crate) fn registrable_domain(host: &str) -> String {
    psl::List
        .domain(host.as_bytes())
        .map(|d| String::from_utf8_lossy(d.as_bytes()).to_string())
        .unwrap_or_else(|| host.to_string())
}

/// Performs all record-type lookups for a host.
///
/// Returns the record map keyed by upper-cased record type; only types with
/// at least one record appear. IP-literal hosts have no registrable domain
/// and are a vacuous success with no records.
///
/// # Errors
///
/// Fails only when every record type failed (transport errors or timeouts on
/// every resolver); a type with an authoritative empty answer counts as
/// success.
pub(crate) async fn lookup_all(
    resolvers: &[TokioAsyncResolver],
    host: &str,
) -> Result<HashMap<String, Vec<String>>, anyhow::Error> {
    if host.parse::<IpAddr>().is_ok() {
        debug!("skipping DNS lookups for IP-literal host {host}");
        return Ok(HashMap::new());
    }
    if resolvers.is_empty() {
        return Err(anyhow!("no DNS resolvers configured"));
    }

    let domain = registrable_domain(host);
    debug!("DNS lookups for {host} use registrable domain {domain}");

    let lookups = DNS_RECORD_TYPES
        .iter()
        .map(|&record_type| lookup_record_type(resolvers, &domain, record_type));
    let outcomes = futures::future::join_all(lookups).await;

    let mut records = HashMap::new();
    let mut failures = 0usize;
    for (record_type, outcome) in DNS_RECORD_TYPES.iter().zip(outcomes) {
        match outcome {
            Ok(values) => {
                if !values.is_empty() {
                    records.insert(record_type.to_string(), values);
                }
            }
            Err(e) => {
                debug!("DNS {record_type} lookup failed for {domain}: {e}");
                failures += 1;
            }
        }
    }

    if failures == DNS_RECORD_TYPES.len() {
        return Err(anyhow!("all record type lookups failed for {domain}"));
    }
    Ok(records)
}

/// Queries one record type, trying each resolver in order. The first resolver
/// with records wins; an authoritative empty answer still counts as success.
async fn lookup_record_type(
    resolvers: &[TokioAsyncResolver],
    domain: &str,
    record_type: RecordType,
) -> Result<Vec<String>, anyhow::Error> {
    let mut answered = false;
    let mut last_error: Option<anyhow::Error> = None;

    for resolver in resolvers {
        let lookup = tokio::time::timeout(DNS_QUERY_TIMEOUT, resolver.lookup(domain, record_type));
        match lookup.await {
            Ok(Ok(response)) => {
                let values = extract_record_values(record_type, response.iter());
                if !values.is_empty() {
                    return Ok(values);
                }
                answered = true;
            }
            Ok(Err(e)) => {
                // NXDomain / NODATA is an answer, not a failure.
                if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
                    answered = true;
                } else {
                    last_error = Some(e.into());
                }
            }
            Err(_) => {
                last_error = Some(anyhow!("query timed out after {DNS_QUERY_TIMEOUT:?}"));
            }
        }
    }

    if answered {
        Ok(Vec::new())
    } else {
        Err(last_error.unwrap_or_else(|| anyhow!("no resolver answered")))
    }
}

/// Converts the answers of one lookup into lower-cased record value strings.
fn extract_record_values<'a>(
    record_type: RecordType,
    answers: impl Iterator<Item = &'a RData>,
) -> Vec<String> {
    let mut values = Vec::new();
    for rdata in answers {
        let value = match (record_type, rdata) {
            (RecordType::TXT, RData::TXT(txt)) => Some(
                txt.iter()
                    .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                    .collect::<Vec<_>>()
                    .join(""),
            ),
            (RecordType::MX, RData::MX(mx)) => Some(mx.exchange().to_utf8()),
            (RecordType::NS, RData::NS(ns)) => Some(ns.to_utf8()),
            (RecordType::SOA, RData::SOA(soa)) => Some(soa.mname().to_utf8()),
            (RecordType::CNAME, RData::CNAME(cname)) => Some(cname.to_utf8()),
            _ => None,
        };
        if let Some(value) = value {
            if !value.is_empty() {
                values.push(value.to_lowercase());
            }
        }
    }
    values
}
