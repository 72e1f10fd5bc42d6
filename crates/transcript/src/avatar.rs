use std::collections::HashMap;
use url::form_urlencoded;

const AVATAR_SCHEME: &str = "avatar:///?";

/// Suffix appended to every cached address of a peer when its avatar changes
const EPOCH_TOKEN: char = 'x';

/// Addresses for avatar images, keyed by peer and display name.
///
/// An address is handed out once per `(peer, display_name)` and reused so
/// the view does not refetch images it already has. Invalidating a peer
/// bumps the epoch of all its addresses, which forces a refetch.
#[derive(Debug, Clone)]
pub struct AvatarAddressCache {
    account: String,
    addresses: HashMap<String, HashMap<String, String>>,
}

impl AvatarAddressCache {
    pub fn new(account: impl Into<String>) -> Self {
        Self { account: account.into(), addresses: HashMap::new() }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn get_address(&mut self, peer_id: &str, display_name: &str) -> String {
        let account = &self.account;
        self.addresses
            .entry(peer_id.to_string())
            .or_default()
            .entry(display_name.to_string())
            .or_insert_with(|| {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("peer", peer_id)
                    .append_pair("nick", display_name)
                    .append_pair("account", account)
                    .finish();
                format!("{}{}#", AVATAR_SCHEME, query)
            })
            .clone()
    }

    /// Bump the epoch of every address cached for `peer_id`.
    ///
    /// Returns false when nothing is cached for the peer, which means no
    /// avatar of theirs has been rendered in this transcript.
    pub fn invalidate(&mut self, peer_id: &str) -> bool {
        let Some(by_name) = self.addresses.get_mut(peer_id) else {
            return false;
        };
        for address in by_name.values_mut() {
            address.push(EPOCH_TOKEN);
        }
        true
    }
}
