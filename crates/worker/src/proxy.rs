//! Proxy login scripts (specification §3, optional per-host proxy script):
//! a `$U<name>;[$P<password>;]...` string chains multiple `USER`/`PASS`
//! round trips through an FTP proxy before the worker reaches the real
//! remote host, in place of the single login the host's own credentials
//! would otherwise perform.

/// One `$U`/`$P` hop parsed out of a host's proxy script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProxyHop {
    pub user: String,
    pub password: String,
}

/// Parses a `$U<name>;[$P<password>;]...` proxy script into the ordered
/// sequence of login hops it describes.
///
/// A `$U` hop with no following `$P` before the next `$U` (or the end of
/// the script) logs in with an empty password, matching a server that
/// accepts `USER` alone.
#[must_use]
pub fn parse(script: &str) -> Vec<ProxyHop> {
    let mut hops = Vec::new();
    let mut pending_user: Option<String> = None;

    for token in script.split('$').skip(1) {
        let token = token.trim_end_matches(';');
        let Some(kind) = token.chars().next() else { continue };
        let value = &token[kind.len_utf8()..];

        match kind {
            'U' | 'u' => {
                if let Some(user) = pending_user.take() {
                    hops.push(ProxyHop { user, password: String::new() });
                }
                pending_user = Some(value.to_string());
            }
            'P' | 'p' => {
                if let Some(user) = pending_user.take() {
                    hops.push(ProxyHop { user, password: value.to_string() });
                }
            }
            _ => {}
        }
    }
    if let Some(user) = pending_user {
        hops.push(ProxyHop { user, password: String::new() });
    }
    hops
}
