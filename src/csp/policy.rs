use super::config::{CspConfig, CspSource};
use super::nonce::{generate_nonce, CSP_NONCE_KEY};
use crate::http::Request;

/// Keywords the Content Security Policy grammar requires in single
/// quotes; bare spellings auto-quote on emission.
const QUOTED_KEYWORDS: &[&str] = &[
    "self",
    "unsafe-inline",
    "unsafe-eval",
    "none",
    "strict-dynamic",
    "unsafe-hashes",
    "report-sample",
    "wasm-unsafe-eval",
];

/// Auto-quote one source token: known keywords gain single quotes;
/// URLs, schemes, hashes, nonces, and already-quoted inputs pass
/// through untouched.
pub fn auto_quote(token: &str) -> String {
    if token.starts_with('\'') && token.ends_with('\'') && token.len() >= 2 {
        return token.to_string();
    }
    if QUOTED_KEYWORDS.contains(&token) {
        return format!("'{}'", token);
    }
    token.to_string()
}

/// A policy compiled against one request: the final header plus the
/// nonce, when one was generated.
#[derive(Debug, Clone)]
pub struct CompiledCsp {
    pub header_name: &'static str,
    pub header_value: String,
    pub nonce: Option<String>,
}

/// Compile a policy for a request. When a directive lists the nonce
/// pseudo-source, one nonce is generated for the whole request, exposed
/// through the request extension map as `csp_nonce`, and emitted as
/// `'nonce-<value>'` in each directive that asked for it.
pub fn compile(config: &CspConfig, request: &Request) -> CompiledCsp {
    let nonce = if config.wants_nonce() {
        let nonce = generate_nonce();
        request.extensions().insert(CSP_NONCE_KEY, nonce.clone());
        Some(nonce)
    } else {
        None
    };

    let mut directives = Vec::with_capacity(config.directives().len());
    for (name, sources) in config.directives() {
        let mut tokens = Vec::with_capacity(sources.len());
        for source in sources {
            match source {
                CspSource::Token(token) => tokens.push(auto_quote(token)),
                CspSource::Nonce => {
                    if let Some(nonce) = &nonce {
                        tokens.push(format!("'nonce-{}'", nonce));
                    }
                }
                CspSource::Callable(func) => tokens.push(auto_quote(&func(request))),
            }
        }
        directives.push(format!("{} {}", name, tokens.join(" ")));
    }

    CompiledCsp {
        header_name: if config.is_report_only() {
            "content-security-policy-report-only"
        } else {
            "content-security-policy"
        },
        header_value: directives.join("; "),
        nonce,
    }
}
