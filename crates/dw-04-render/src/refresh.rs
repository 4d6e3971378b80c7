//! # Page Refresh Routines
//!
//! Patch rendered elements once the data they wait for has arrived.
//! Elements name the identity they show in a `did` attribute; a value
//! starting with `$` is an unrendered template and is skipped. Once an
//! element is resolved its `did` attribute is removed.

use dw_01_template::format_timestamp;
use dw_03_metadata::MetadataApi;
use shared_types::{Identity, MessagingLibrary};
use tracing::{debug, warn};

use crate::domain::{Document, Element};

/// `did` attribute name.
pub const DID: &str = "did";

fn pending_identity(element: &Element, library: &dyn MessagingLibrary) -> Option<Identity> {
    let did = element.attribute(DID)?;
    if did.is_empty() || did.starts_with('$') {
        return None;
    }
    match library.identity(did) {
        Ok(identity) => Some(identity),
        Err(e) => {
            warn!(did, error = %e, "Cannot resolve element identity");
            None
        }
    }
}

/// Replace the unix-seconds text of `.timestamp` elements with local time.
pub fn refresh_timestamps(doc: &mut Document) -> usize {
    let mut updated = 0;
    doc.for_each_by_class("timestamp", |span| {
        let Ok(secs) = span.text().trim().parse::<i64>() else {
            return;
        };
        if let Some(text) = format_timestamp(secs) {
            span.set_text(&text);
            updated += 1;
        }
    });
    updated
}

/// Point `.avatar` images at the avatar of their identity's profile.
pub fn refresh_avatars(
    doc: &mut Document,
    metadata: &dyn MetadataApi,
    library: &dyn MessagingLibrary,
) -> usize {
    let mut updated = 0;
    doc.for_each_by_class("avatar", |img| {
        let Some(identity) = pending_identity(img, library) else {
            return;
        };
        let Ok(Some(profile)) = metadata.get_profile(&identity) else {
            return;
        };
        if let Some(url) = profile.avatar() {
            img.set_attribute("src", &url);
        }
        img.remove_attribute(DID);
        updated += 1;
    });
    debug!(updated, "Avatars refreshed");
    updated
}

/// Fill `.nickname` elements with `"{name} ({number})"`.
pub fn refresh_nicknames(
    doc: &mut Document,
    metadata: &dyn MetadataApi,
    library: &dyn MessagingLibrary,
) -> usize {
    let mut updated = 0;
    doc.for_each_by_class("nickname", |span| {
        let Some(identity) = pending_identity(span, library) else {
            return;
        };
        let Ok(Some(profile)) = metadata.get_profile(&identity) else {
            return;
        };
        let name = profile
            .name()
            .or_else(|| identity.name().map(str::to_string))
            .unwrap_or_else(|| identity.to_string());
        let number = library.number_string(&identity);
        span.set_text(&format!("{name} ({number})"));
        span.remove_attribute(DID);
        updated += 1;
    });
    debug!(updated, "Nicknames refreshed");
    updated
}

/// Point `A` elements at the user page of their identity.
pub fn refresh_links(doc: &mut Document, library: &dyn MessagingLibrary, base_url: &str) -> usize {
    let mut updated = 0;
    doc.for_each_by_tag("a", |a| {
        let Some(identity) = pending_identity(a, library) else {
            return;
        };
        a.set_attribute("href", &user_url(base_url, &identity));
        a.remove_attribute(DID);
        updated += 1;
    });
    debug!(updated, "Links refreshed");
    updated
}

/// `{base_url}user/{address}`.
pub fn user_url(base_url: &str, identity: &Identity) -> String {
    format!("{}/user/{}", base_url.trim_end_matches('/'), identity.address())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dw_03_metadata::MetadataError;
    use parking_lot::Mutex;
    use shared_crypto::{Account, DimLibrary};
    use shared_types::{Meta, Payload, Profile, Request};
    use std::collections::{BTreeMap, HashMap};

    #[derive(Default)]
    struct StubMetadata {
        profiles: HashMap<String, Profile>,
        asked: Mutex<Vec<String>>,
    }

    impl MetadataApi for StubMetadata {
        fn get_meta(&self, _identity: &Identity) -> Result<Option<Meta>, MetadataError> {
            Ok(None)
        }
        fn get_profile(&self, identity: &Identity) -> Result<Option<Profile>, MetadataError> {
            self.asked.lock().push(identity.address().to_string());
            Ok(self.profiles.get(identity.address()).cloned())
        }
        fn known_identity(&self, _address: &str) -> Option<Identity> {
            None
        }
        fn on_meta_response(&self, _: &Payload, _: &Request) -> Result<Identity, MetadataError> {
            Err(MetadataError::LibraryNotLoaded)
        }
        fn on_profile_response(&self, _: &Payload, _: &Request) -> Result<Identity, MetadataError> {
            Err(MetadataError::LibraryNotLoaded)
        }
    }

    #[test]
    fn test_timestamps() {
        let mut doc =
            Document::parse(r#"<span class="timestamp">1560000000</span><span class="timestamp">${time}</span>"#)
                .unwrap();
        assert_eq!(refresh_timestamps(&mut doc), 1);
        let expected = format_timestamp(1_560_000_000).unwrap();
        assert!(doc.to_html().contains(&expected));
        assert!(doc.to_html().contains("${time}"));
        // Already converted text is left alone.
        assert_eq!(refresh_timestamps(&mut doc), 0);
    }

    #[test]
    fn test_links_resolve_and_skip_templates() {
        let lib = DimLibrary::new();
        let moky = Account::generate("moky").identity();
        let html = format!(r#"<a did="{moky}">moky</a><a did="${{sender}}">t</a>"#);
        let mut doc = Document::parse(&html).unwrap();

        assert_eq!(refresh_links(&mut doc, &lib, "http://dwitter.test/"), 1);
        let out = doc.to_html();
        assert!(out.contains(&format!(
            r#"<a href="http://dwitter.test/user/{}">moky</a>"#,
            moky.address()
        )));
        assert!(out.contains(r#"did="${sender}""#));
    }

    #[test]
    fn test_nicknames_and_avatars_wait_for_profile() {
        let lib = DimLibrary::new();
        let account = Account::generate("moky");
        let moky = account.identity();
        let html = format!(
            r#"<span class="nickname" did="{moky}">?</span><img class="avatar" did="{moky}">"#
        );
        let mut doc = Document::parse(&html).unwrap();

        let empty = StubMetadata::default();
        assert_eq!(refresh_nicknames(&mut doc, &empty, &lib), 0);
        assert_eq!(refresh_avatars(&mut doc, &empty, &lib), 0);
        assert_eq!(empty.asked.lock().len(), 2);

        let mut props = BTreeMap::new();
        props.insert("name".to_string(), "Moky Zhang".to_string());
        props.insert("avatar".to_string(), "http://img/moky.png".to_string());
        let mut loaded = StubMetadata::default();
        loaded
            .profiles
            .insert(moky.address().to_string(), account.profile(&props));

        assert_eq!(refresh_nicknames(&mut doc, &loaded, &lib), 1);
        assert_eq!(refresh_avatars(&mut doc, &loaded, &lib), 1);

        let out = doc.to_html();
        let number = lib.number_string(&moky);
        assert!(out.contains(&format!(r#"<span class="nickname">Moky Zhang ({number})</span>"#)));
        assert!(out.contains(r#"<img class="avatar" src="http://img/moky.png">"#));
        // Resolved elements are not revisited.
        assert_eq!(refresh_nicknames(&mut doc, &loaded, &lib), 0);
    }

    #[test]
    fn test_nickname_falls_back_to_identity_name() {
        let lib = DimLibrary::new();
        let account = Account::generate("hulk");
        let hulk = account.identity();
        let mut doc =
            Document::parse(&format!(r#"<b class="nickname" did="{hulk}"></b>"#)).unwrap();
        let mut stub = StubMetadata::default();
        stub.profiles
            .insert(hulk.address().to_string(), account.profile(&BTreeMap::new()));

        refresh_nicknames(&mut doc, &stub, &lib);
        assert!(doc.to_html().contains(&format!("hulk ({})", lib.number_string(&hulk))));
    }
}
