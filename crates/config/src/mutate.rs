//! Mutation engine over the raw document.
//!
//! Every mutator acts on [`SuperJsonDocument`] in place and returns whether the
//! document changed. Merge decisions, for every entry kind:
//! 1. missing target: insert the payload verbatim
//! 2. shorthand payload: replace a sibling-free target, otherwise fold the
//!    string into the promoted full record
//! 3. full payload: merge over the existing record (defaults deep-merge,
//!    nested entries merge recursively)

use crate::document::{
    ProfileEntry, ProfileProviderEntry, ProfileProviderSettings, ProfileProviderSource,
    ProfileSettings, ProviderEntry, ProviderSettings, SuperJsonDocument,
};
use crate::merge::{merge_security, merge_usecase_defaults};
use crate::normalize::classify_profile_shorthand;
use indexmap::IndexMap;
use superface_domain::{strip_file_uri, to_file_uri};
use superface_shared::{ErrorCode, ErrorEnvelope};

/// Failed mutation precondition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// Target profile does not exist.
    #[error("profile \"{profile}\" not found")]
    ProfileNotFound {
        /// Profile id.
        profile: String,
    },
    /// Target profile provider does not exist.
    #[error("provider \"{provider}\" not found for profile \"{profile}\"")]
    ProfileProviderNotFound {
        /// Profile id.
        profile: String,
        /// Provider name.
        provider: String,
    },
    /// Target provider does not exist.
    #[error("provider \"{provider}\" not found")]
    ProviderNotFound {
        /// Provider name.
        provider: String,
    },
    /// A shorthand string cannot be folded into a full record.
    #[error("invalid {kind} shorthand: \"{value}\"")]
    InvalidShorthand {
        /// Entry kind (`profile`, `profile provider`, `provider`).
        kind: &'static str,
        /// Offending string.
        value: String,
    },
    /// `set_priority` on a profile without providers.
    #[error("profile \"{profile}\" has no providers")]
    PriorityNoProviders {
        /// Profile id.
        profile: String,
    },
    /// `set_priority` with an order that is not a permutation of the providers.
    #[error("priority {actual:?} does not match providers {expected:?} of profile \"{profile}\"")]
    PriorityMismatch {
        /// Profile id.
        profile: String,
        /// Declared profile providers.
        expected: Vec<String>,
        /// Requested order.
        actual: Vec<String>,
    },
    /// `set_priority` names a provider missing from the top-level providers.
    #[error("provider \"{provider}\" in priority of \"{profile}\" is not declared in providers")]
    PriorityProviderNotDeclared {
        /// Profile id.
        profile: String,
        /// Provider name.
        provider: String,
    },
}

impl MutationError {
    fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::ProfileNotFound { .. } => "profile_not_found",
            Self::ProfileProviderNotFound { .. } => "profile_provider_not_found",
            Self::ProviderNotFound { .. } => "provider_not_found",
            Self::InvalidShorthand { .. } => "invalid_entry",
            Self::PriorityNoProviders { .. } => "priority_no_providers",
            Self::PriorityMismatch { .. } => "priority_mismatch",
            Self::PriorityProviderNotDeclared { .. } => "priority_provider_not_declared",
        };
        ErrorCode::new("superjson", code)
    }
}

impl From<MutationError> for ErrorEnvelope {
    fn from(error: MutationError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            MutationError::ProfileNotFound { profile }
            | MutationError::PriorityNoProviders { profile }
            | MutationError::PriorityMismatch { profile, .. } => {
                envelope.with_metadata("profile", profile)
            },
            MutationError::ProfileProviderNotFound { profile, provider }
            | MutationError::PriorityProviderNotDeclared { profile, provider } => envelope
                .with_metadata("profile", profile)
                .with_metadata("provider", provider),
            MutationError::ProviderNotFound { provider } => {
                envelope.with_metadata("provider", provider)
            },
            MutationError::InvalidShorthand { kind, value } => envelope
                .with_metadata("kind", kind)
                .with_metadata("value", value),
        }
    }
}

/// Target representation for [`SuperJsonDocument::swap_profile_provider_variant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileProviderVariant {
    /// Local map file.
    Local {
        /// Path relative to the document directory (`file://` optional).
        file: String,
    },
    /// Registry map.
    Remote {
        /// Map variant.
        map_variant: Option<String>,
        /// Map revision.
        map_revision: Option<String>,
    },
}

/// Target representation for [`SuperJsonDocument::swap_provider_variant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderVariant {
    /// Local provider descriptor.
    Local {
        /// Path relative to the document directory (`file://` optional).
        file: String,
    },
    /// Registry provider descriptor.
    Remote,
}

fn plain_path(file: &str) -> String {
    strip_file_uri(file).unwrap_or(file).to_owned()
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, next: T) -> bool {
    if *slot == next {
        return false;
    }
    *slot = next;
    true
}

// =============================================================================
// ENTRY MERGES
// =============================================================================

fn promote_profile(entry: &ProfileEntry) -> Result<ProfileSettings, MutationError> {
    match entry {
        ProfileEntry::Full(settings) => Ok(settings.clone()),
        ProfileEntry::Shorthand(value) => classify_profile_shorthand(value)
            .map(ProfileSettings::from_source)
            .map_err(|_| MutationError::InvalidShorthand {
                kind: "profile",
                value: value.clone(),
            }),
    }
}

fn merged_profile(
    existing: &ProfileEntry,
    payload: &ProfileEntry,
) -> Result<ProfileEntry, MutationError> {
    match payload {
        ProfileEntry::Shorthand(value) => match existing {
            ProfileEntry::Full(settings) if !settings.has_no_siblings() => {
                let source = classify_profile_shorthand(value).map_err(|_| {
                    MutationError::InvalidShorthand {
                        kind: "profile",
                        value: value.clone(),
                    }
                })?;
                Ok(ProfileEntry::Full(ProfileSettings {
                    source,
                    ..settings.clone()
                }))
            },
            _ => Ok(payload.clone()),
        },
        ProfileEntry::Full(incoming) => {
            let mut merged = promote_profile(existing)?;
            merged.source = incoming.source.clone();
            merged.defaults =
                merge_usecase_defaults(merged.defaults.as_ref(), incoming.defaults.as_ref());
            if let Some(priority) = &incoming.priority {
                merged.priority = Some(priority.clone());
            }
            if let Some(providers) = &incoming.providers {
                let target = merged.providers.get_or_insert_with(IndexMap::new);
                for (name, provider) in providers {
                    let next = match target.get(name) {
                        Some(current) => merged_profile_provider(current, provider)?,
                        None => provider.clone(),
                    };
                    target.insert(name.clone(), next);
                }
                if let Some(priority) = merged.priority.as_mut() {
                    for name in providers.keys() {
                        if !priority.contains(name) {
                            priority.push(name.clone());
                        }
                    }
                }
            }
            Ok(ProfileEntry::Full(merged))
        },
    }
}

fn merged_profile_provider(
    existing: &ProfileProviderEntry,
    payload: &ProfileProviderEntry,
) -> Result<ProfileProviderEntry, MutationError> {
    match payload {
        ProfileProviderEntry::Shorthand(value) => match existing {
            ProfileProviderEntry::Full(settings) if !settings.has_no_siblings() => {
                let Some(file) = strip_file_uri(value) else {
                    return Err(MutationError::InvalidShorthand {
                        kind: "profile provider",
                        value: value.clone(),
                    });
                };
                Ok(ProfileProviderEntry::Full(ProfileProviderSettings {
                    source: ProfileProviderSource::File {
                        file: file.to_owned(),
                    },
                    defaults: settings.defaults.clone(),
                }))
            },
            _ => Ok(payload.clone()),
        },
        ProfileProviderEntry::Full(incoming) => {
            let current = match existing {
                ProfileProviderEntry::Full(settings) => settings.clone(),
                ProfileProviderEntry::Shorthand(value) => ProfileProviderSettings {
                    source: strip_file_uri(value).map_or_else(ProfileProviderSource::remote, |file| {
                        ProfileProviderSource::File {
                            file: file.to_owned(),
                        }
                    }),
                    defaults: None,
                },
            };
            let source = if incoming.source.is_unpinned_remote() {
                current.source
            } else {
                incoming.source.clone()
            };
            Ok(ProfileProviderEntry::Full(ProfileProviderSettings {
                source,
                defaults: merge_usecase_defaults(
                    current.defaults.as_ref(),
                    incoming.defaults.as_ref(),
                ),
            }))
        },
    }
}

fn merged_provider(
    existing: &ProviderEntry,
    payload: &ProviderEntry,
) -> Result<ProviderEntry, MutationError> {
    match payload {
        ProviderEntry::Shorthand(value) => match existing {
            ProviderEntry::Full(settings) if !settings.has_no_siblings() => {
                let Some(file) = strip_file_uri(value) else {
                    return Err(MutationError::InvalidShorthand {
                        kind: "provider",
                        value: value.clone(),
                    });
                };
                Ok(ProviderEntry::Full(ProviderSettings {
                    file: Some(file.to_owned()),
                    ..settings.clone()
                }))
            },
            _ => Ok(payload.clone()),
        },
        ProviderEntry::Full(incoming) => {
            let current = match existing {
                ProviderEntry::Full(settings) => settings.clone(),
                ProviderEntry::Shorthand(value) => ProviderSettings {
                    file: strip_file_uri(value).map(str::to_owned),
                    ..ProviderSettings::default()
                },
            };
            let security = match (&current.security, &incoming.security) {
                (None, None) => None,
                (left, right) => Some(merge_security(
                    left.as_deref().unwrap_or_default(),
                    right.as_deref().unwrap_or_default(),
                )),
            };
            let parameters = match (&current.parameters, &incoming.parameters) {
                (None, None) => None,
                (left, right) => {
                    let mut merged = left.clone().unwrap_or_default();
                    merged.extend(right.iter().flatten().map(|(k, v)| (k.clone(), v.clone())));
                    Some(merged)
                },
            };
            Ok(ProviderEntry::Full(ProviderSettings {
                file: incoming.file.clone().or(current.file),
                security,
                parameters,
            }))
        },
    }
}

// =============================================================================
// DOCUMENT MUTATORS
// =============================================================================

impl SuperJsonDocument {
    /// Merge a profile entry into the document.
    ///
    /// Providers new to a profile with an explicit priority are appended to it.
    pub fn add_profile(
        &mut self,
        profile: &str,
        payload: ProfileEntry,
    ) -> Result<bool, MutationError> {
        let Some(existing) = self.profiles.get_mut(profile) else {
            self.profiles.insert(profile.to_owned(), payload);
            return Ok(true);
        };
        let next = merged_profile(existing, &payload)?;
        Ok(replace_if_changed(existing, next))
    }

    /// Merge a profile-provider entry into an existing profile.
    ///
    /// A provider that is new to a profile with an explicit priority is
    /// appended to that priority.
    pub fn add_profile_provider(
        &mut self,
        profile: &str,
        provider: &str,
        payload: ProfileProviderEntry,
    ) -> Result<bool, MutationError> {
        let Some(existing) = self.profiles.get_mut(profile) else {
            return Err(MutationError::ProfileNotFound {
                profile: profile.to_owned(),
            });
        };
        let mut settings = promote_profile(existing)?;
        let providers = settings.providers.get_or_insert_with(IndexMap::new);
        let next = match providers.get(provider) {
            Some(current) => merged_profile_provider(current, &payload)?,
            None => payload,
        };
        providers.insert(provider.to_owned(), next);
        if let Some(priority) = settings.priority.as_mut()
            && !priority.iter().any(|name| name == provider)
        {
            priority.push(provider.to_owned());
        }

        if matches!(&*existing, ProfileEntry::Full(current) if *current == settings) {
            return Ok(false);
        }
        *existing = ProfileEntry::Full(settings);
        Ok(true)
    }

    /// Merge a provider entry into the document.
    pub fn add_provider(
        &mut self,
        provider: &str,
        payload: ProviderEntry,
    ) -> Result<bool, MutationError> {
        let Some(existing) = self.providers.get_mut(provider) else {
            self.providers.insert(provider.to_owned(), payload);
            return Ok(true);
        };
        let next = merged_provider(existing, &payload)?;
        Ok(replace_if_changed(existing, next))
    }

    /// Set the explicit provider priority of a profile.
    ///
    /// `order` must be a permutation of the profile's providers, each of which
    /// must be declared at the top level.
    pub fn set_priority(&mut self, profile: &str, order: &[String]) -> Result<bool, MutationError> {
        let Some(existing) = self.profiles.get_mut(profile) else {
            return Err(MutationError::ProfileNotFound {
                profile: profile.to_owned(),
            });
        };
        let ProfileEntry::Full(settings) = existing else {
            return Err(MutationError::PriorityNoProviders {
                profile: profile.to_owned(),
            });
        };
        let Some(providers) = settings.providers.as_ref().filter(|p| !p.is_empty()) else {
            return Err(MutationError::PriorityNoProviders {
                profile: profile.to_owned(),
            });
        };

        let mut expected: Vec<String> = providers.keys().cloned().collect();
        let mut actual = order.to_vec();
        expected.sort();
        actual.sort();
        if expected != actual {
            return Err(MutationError::PriorityMismatch {
                profile: profile.to_owned(),
                expected: providers.keys().cloned().collect(),
                actual: order.to_vec(),
            });
        }
        if let Some(missing) = order
            .iter()
            .find(|name| !self.providers.contains_key(name.as_str()))
        {
            return Err(MutationError::PriorityProviderNotDeclared {
                profile: profile.to_owned(),
                provider: missing.clone(),
            });
        }

        Ok(replace_if_changed(
            &mut settings.priority,
            Some(order.to_vec()),
        ))
    }

    /// Replace a profile entry verbatim.
    pub fn set_profile(&mut self, profile: &str, entry: ProfileEntry) -> bool {
        match self.profiles.get_mut(profile) {
            Some(existing) => replace_if_changed(existing, entry),
            None => {
                self.profiles.insert(profile.to_owned(), entry);
                true
            },
        }
    }

    /// Replace a profile-provider entry verbatim.
    pub fn set_profile_provider(
        &mut self,
        profile: &str,
        provider: &str,
        entry: ProfileProviderEntry,
    ) -> Result<bool, MutationError> {
        let Some(existing) = self.profiles.get_mut(profile) else {
            return Err(MutationError::ProfileNotFound {
                profile: profile.to_owned(),
            });
        };
        let mut settings = promote_profile(existing)?;
        settings
            .providers
            .get_or_insert_with(IndexMap::new)
            .insert(provider.to_owned(), entry);
        Ok(replace_if_changed(existing, ProfileEntry::Full(settings)))
    }

    /// Replace a provider entry verbatim.
    pub fn set_provider(&mut self, provider: &str, entry: ProviderEntry) -> bool {
        match self.providers.get_mut(provider) {
            Some(existing) => replace_if_changed(existing, entry),
            None => {
                self.providers.insert(provider.to_owned(), entry);
                true
            },
        }
    }

    /// Remove a profile.
    pub fn unset_profile(&mut self, profile: &str) -> bool {
        self.profiles.shift_remove(profile).is_some()
    }

    /// Remove a provider from a profile, including its priority slot.
    pub fn unset_profile_provider(&mut self, profile: &str, provider: &str) -> bool {
        let Some(ProfileEntry::Full(settings)) = self.profiles.get_mut(profile) else {
            return false;
        };
        let removed = settings
            .providers
            .as_mut()
            .is_some_and(|providers| providers.shift_remove(provider).is_some());
        let mut reprioritized = false;
        if let Some(priority) = settings.priority.as_mut() {
            let before = priority.len();
            priority.retain(|name| name != provider);
            reprioritized = priority.len() != before;
        }
        removed || reprioritized
    }

    /// Remove a provider.
    pub fn unset_provider(&mut self, provider: &str) -> bool {
        self.providers.shift_remove(provider).is_some()
    }

    /// Switch a profile provider between a local map file and a registry map.
    pub fn swap_profile_provider_variant(
        &mut self,
        profile: &str,
        provider: &str,
        variant: ProfileProviderVariant,
    ) -> Result<bool, MutationError> {
        let settings = match self.profiles.get_mut(profile) {
            None => {
                return Err(MutationError::ProfileNotFound {
                    profile: profile.to_owned(),
                });
            },
            Some(ProfileEntry::Full(settings)) => Some(settings),
            Some(ProfileEntry::Shorthand(_)) => None,
        };
        let Some(existing) = settings
            .and_then(|settings| settings.providers.as_mut())
            .and_then(|providers| providers.get_mut(provider))
        else {
            return Err(MutationError::ProfileProviderNotFound {
                profile: profile.to_owned(),
                provider: provider.to_owned(),
            });
        };

        let defaults = match existing {
            ProfileProviderEntry::Full(current) => current.defaults.clone(),
            ProfileProviderEntry::Shorthand(_) => None,
        };
        let next = match variant {
            ProfileProviderVariant::Local { file }
                if defaults.as_ref().is_none_or(IndexMap::is_empty) =>
            {
                ProfileProviderEntry::Shorthand(to_file_uri(&plain_path(&file)))
            },
            ProfileProviderVariant::Local { file } => {
                ProfileProviderEntry::Full(ProfileProviderSettings {
                    source: ProfileProviderSource::File {
                        file: plain_path(&file),
                    },
                    defaults,
                })
            },
            ProfileProviderVariant::Remote {
                map_variant,
                map_revision,
            } => ProfileProviderEntry::Full(ProfileProviderSettings {
                source: ProfileProviderSource::Remote {
                    map_variant,
                    map_revision,
                },
                defaults,
            }),
        };
        Ok(replace_if_changed(existing, next))
    }

    /// Switch a provider between a local descriptor and the registry.
    pub fn swap_provider_variant(
        &mut self,
        provider: &str,
        variant: ProviderVariant,
    ) -> Result<bool, MutationError> {
        let Some(existing) = self.providers.get_mut(provider) else {
            return Err(MutationError::ProviderNotFound {
                provider: provider.to_owned(),
            });
        };
        let current = match existing {
            ProviderEntry::Full(settings) => settings.clone(),
            ProviderEntry::Shorthand(_) => ProviderSettings::default(),
        };
        let next = match variant {
            ProviderVariant::Local { file } if current.has_no_siblings() => {
                ProviderEntry::Shorthand(to_file_uri(&plain_path(&file)))
            },
            ProviderVariant::Local { file } => ProviderEntry::Full(ProviderSettings {
                file: Some(plain_path(&file)),
                ..current
            }),
            ProviderVariant::Remote => ProviderEntry::Full(ProviderSettings {
                file: None,
                ..current
            }),
        };
        Ok(replace_if_changed(existing, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SecurityValues;
    use serde_json::{Value, json};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn document(value: Value) -> Result<SuperJsonDocument, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn add_profile_is_idempotent() -> TestResult {
        let mut doc = SuperJsonDocument::default();
        let payload: ProfileEntry = serde_json::from_value(json!({
            "version": "1.0.0",
            "defaults": { "Send": { "input": { "a": 1 } } },
            "providers": { "q": {} }
        }))?;
        assert!(doc.add_profile("p", payload.clone())?);
        assert!(!doc.add_profile("p", payload)?);

        let shorthand = ProfileEntry::Shorthand("2.0.0".into());
        assert!(doc.add_profile("p", shorthand.clone())?);
        assert!(!doc.add_profile("p", shorthand)?);
        Ok(())
    }

    #[test]
    fn shorthand_folds_into_record_with_siblings() -> TestResult {
        let mut doc = document(json!({
            "profiles": { "p": { "version": "1.0.0", "defaults": { "Send": {} } } }
        }))?;
        assert!(doc.add_profile("p", ProfileEntry::Shorthand("file://p.supr".into()))?);
        assert_eq!(
            serde_json::to_value(&doc)?,
            json!({ "profiles": { "p": { "file": "p.supr", "defaults": { "Send": {} } } } })
        );

        let mut bare = document(json!({ "profiles": { "p": { "version": "1.0.0" } } }))?;
        assert!(bare.add_profile("p", ProfileEntry::Shorthand("1.1.0".into()))?);
        assert_eq!(
            bare.profiles.get("p"),
            Some(&ProfileEntry::Shorthand("1.1.0".into()))
        );
        Ok(())
    }

    #[test]
    fn full_payload_merges_defaults_and_nested_providers() -> TestResult {
        let mut doc = document(json!({
            "profiles": { "p": {
                "version": "1.0.0",
                "defaults": { "Send": { "input": { "a": 1, "n": { "x": 1 } } } },
                "providers": { "q": { "defaults": { "Send": { "input": { "k": true } } } } }
            } }
        }))?;
        let payload: ProfileEntry = serde_json::from_value(json!({
            "version": "1.0.0",
            "defaults": { "Send": { "input": { "n": { "y": 2 } } } },
            "providers": { "q": { "mapRevision": "7" }, "r": "file://r.suma" }
        }))?;
        assert!(doc.add_profile("p", payload)?);
        assert_eq!(
            serde_json::to_value(&doc)?,
            json!({ "profiles": { "p": {
                "version": "1.0.0",
                "defaults": { "Send": { "input": { "a": 1, "n": { "x": 1, "y": 2 } } } },
                "providers": {
                    "q": { "mapRevision": "7", "defaults": { "Send": { "input": { "k": true } } } },
                    "r": "file://r.suma"
                }
            } } })
        );
        Ok(())
    }

    #[test]
    fn full_payload_appends_new_providers_to_explicit_priority() -> TestResult {
        let mut doc = document(json!({
            "profiles": { "p": { "version": "1.0.0", "priority": ["a"], "providers": { "a": {} } } },
            "providers": { "a": {}, "b": {} }
        }))?;
        let payload: ProfileEntry = serde_json::from_value(json!({
            "version": "1.0.0",
            "providers": { "b": {}, "a": { "mapRevision": "2" } }
        }))?;
        assert!(doc.add_profile("p", payload.clone())?);
        assert!(!doc.add_profile("p", payload)?);
        let Some(ProfileEntry::Full(settings)) = doc.profiles.get("p") else {
            return Err("expected full profile".into());
        };
        assert_eq!(settings.priority.as_deref(), Some(&["a".to_owned(), "b".to_owned()][..]));

        let order = vec!["b".to_owned(), "a".to_owned()];
        assert!(doc.set_priority("p", &order)?);
        Ok(())
    }

    #[test]
    fn add_profile_provider_requires_profile_and_appends_priority() -> TestResult {
        let mut doc = SuperJsonDocument::default();
        let missing = doc.add_profile_provider("p", "q", ProfileProviderEntry::Shorthand("file://m".into()));
        assert!(matches!(missing, Err(MutationError::ProfileNotFound { .. })));

        doc = document(json!({
            "profiles": { "p": { "version": "1.0.0", "priority": ["a"], "providers": { "a": {} } } }
        }))?;
        let payload = ProfileProviderEntry::Full(ProfileProviderSettings {
            source: ProfileProviderSource::remote(),
            defaults: None,
        });
        assert!(doc.add_profile_provider("p", "b", payload.clone())?);
        assert!(!doc.add_profile_provider("p", "b", payload)?);
        let Some(ProfileEntry::Full(settings)) = doc.profiles.get("p") else {
            return Err("expected full profile".into());
        };
        assert_eq!(settings.priority.as_deref(), Some(&["a".to_owned(), "b".to_owned()][..]));
        Ok(())
    }

    #[test]
    fn add_profile_provider_promotes_shorthand_profile() -> TestResult {
        let mut doc = document(json!({ "profiles": { "p": "1.0.0" } }))?;
        assert!(doc.add_profile_provider("p", "q", ProfileProviderEntry::Shorthand("file://q.suma".into()))?);
        assert_eq!(
            serde_json::to_value(&doc)?,
            json!({ "profiles": { "p": { "version": "1.0.0", "providers": { "q": "file://q.suma" } } } })
        );
        Ok(())
    }

    #[test]
    fn add_provider_merges_security_and_parameters() -> TestResult {
        let mut doc = document(json!({
            "providers": { "q": {
                "file": "q.json",
                "security": [{ "id": "a", "apikey": "1" }],
                "parameters": { "region": "eu" }
            } }
        }))?;
        let payload: ProviderEntry = serde_json::from_value(json!({
            "security": [{ "id": "b", "token": "t" }, { "id": "a", "apikey": "2" }],
            "parameters": { "tier": "pro" }
        }))?;
        assert!(doc.add_provider("q", payload.clone())?);
        assert!(!doc.add_provider("q", payload)?);
        assert_eq!(
            serde_json::to_value(&doc)?,
            json!({ "providers": { "q": {
                "file": "q.json",
                "security": [{ "id": "a", "apikey": "2" }, { "id": "b", "token": "t" }],
                "parameters": { "region": "eu", "tier": "pro" }
            } } })
        );

        let shorthand = ProviderEntry::Shorthand("file://other.json".into());
        assert!(doc.add_provider("q", shorthand)?);
        let Some(ProviderEntry::Full(settings)) = doc.providers.get("q") else {
            return Err("expected full provider".into());
        };
        assert_eq!(settings.file.as_deref(), Some("other.json"));
        assert_eq!(
            settings.security.as_ref().and_then(|s| s.first()),
            Some(&SecurityValues::ApiKey { id: "a".into(), apikey: "2".into() })
        );
        Ok(())
    }

    #[test]
    fn set_priority_checks_preconditions() -> TestResult {
        let order: Vec<String> = ["first", "second", "third"].map(String::from).to_vec();
        let mut doc = document(json!({
            "profiles": { "p": { "version": "1.0.0", "providers": { "first": {}, "second": {}, "third": {} } } }
        }))?;

        assert!(matches!(
            doc.set_priority("p", &order),
            Err(MutationError::PriorityProviderNotDeclared { .. })
        ));
        assert!(matches!(
            doc.set_priority("missing", &order),
            Err(MutationError::ProfileNotFound { .. })
        ));
        assert!(matches!(
            doc.set_priority("p", &order[..2]),
            Err(MutationError::PriorityMismatch { .. })
        ));

        for name in &order {
            doc.add_provider(name, ProviderEntry::Full(ProviderSettings::default()))?;
        }
        assert!(doc.set_priority("p", &order)?);
        assert!(!doc.set_priority("p", &order)?);

        let mut bare = document(json!({ "profiles": { "p": "1.0.0" } }))?;
        assert!(matches!(
            bare.set_priority("p", &order),
            Err(MutationError::PriorityNoProviders { .. })
        ));
        Ok(())
    }

    #[test]
    fn unset_removes_entries_and_priority_slots() -> TestResult {
        let mut doc = document(json!({
            "profiles": { "p": { "version": "1.0.0", "priority": ["a", "b"], "providers": { "a": {}, "b": {} } } },
            "providers": { "a": {}, "b": {} }
        }))?;
        assert!(doc.unset_profile_provider("p", "a"));
        assert!(!doc.unset_profile_provider("p", "a"));
        assert!(doc.unset_provider("a"));
        assert!(!doc.unset_provider("a"));
        assert_eq!(
            serde_json::to_value(&doc)?,
            json!({
                "profiles": { "p": { "version": "1.0.0", "priority": ["b"], "providers": { "b": {} } } },
                "providers": { "b": {} }
            })
        );
        assert!(doc.unset_profile("p"));
        assert!(!doc.unset_profile("p"));
        Ok(())
    }

    #[test]
    fn set_replaces_verbatim() -> TestResult {
        let mut doc = document(json!({ "profiles": { "p": { "version": "1.0.0", "defaults": { "A": {} } } } }))?;
        assert!(doc.set_profile("p", ProfileEntry::Shorthand("1.0.0".into())));
        assert!(!doc.set_profile("p", ProfileEntry::Shorthand("1.0.0".into())));
        assert!(doc.set_provider("q", ProviderEntry::Shorthand("file://q.json".into())));
        assert!(doc.set_profile_provider("p", "q", ProfileProviderEntry::Shorthand("file://m.suma".into()))?);
        assert_eq!(
            serde_json::to_value(&doc)?,
            json!({
                "profiles": { "p": { "version": "1.0.0", "providers": { "q": "file://m.suma" } } },
                "providers": { "q": "file://q.json" }
            })
        );
        Ok(())
    }

    #[test]
    fn swap_profile_provider_variant_preserves_defaults() -> TestResult {
        let mut doc = document(json!({
            "profiles": { "p": { "version": "1.0.0", "providers": {
                "q": { "mapVariant": "v" },
                "r": { "mapRevision": "1", "defaults": { "Send": { "input": { "a": 1 } } } }
            } } }
        }))?;

        assert!(doc.swap_profile_provider_variant(
            "p",
            "q",
            ProfileProviderVariant::Local { file: "q.suma".into() }
        )?);
        assert!(doc.swap_profile_provider_variant(
            "p",
            "r",
            ProfileProviderVariant::Local { file: "file://r.suma".into() }
        )?);
        assert_eq!(
            serde_json::to_value(&doc)?,
            json!({ "profiles": { "p": { "version": "1.0.0", "providers": {
                "q": "file://q.suma",
                "r": { "file": "r.suma", "defaults": { "Send": { "input": { "a": 1 } } } }
            } } } })
        );

        assert!(doc.swap_profile_provider_variant(
            "p",
            "r",
            ProfileProviderVariant::Remote { map_variant: Some("main".into()), map_revision: None }
        )?);
        assert!(matches!(
            doc.swap_profile_provider_variant("p", "x", ProfileProviderVariant::Remote { map_variant: None, map_revision: None }),
            Err(MutationError::ProfileProviderNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn swap_provider_variant_preserves_security() -> TestResult {
        let mut doc = document(json!({
            "providers": {
                "bare": { "file": "bare.json" },
                "secured": { "file": "s.json", "security": [{ "id": "k", "apikey": "$K" }] }
            }
        }))?;
        assert!(doc.swap_provider_variant("bare", ProviderVariant::Local { file: "b.json".into() })?);
        assert!(doc.swap_provider_variant("secured", ProviderVariant::Remote)?);
        assert!(!doc.swap_provider_variant("secured", ProviderVariant::Remote)?);
        assert_eq!(
            serde_json::to_value(&doc)?,
            json!({ "providers": {
                "bare": "file://b.json",
                "secured": { "security": [{ "id": "k", "apikey": "$K" }] }
            } })
        );
        assert!(matches!(
            doc.swap_provider_variant("missing", ProviderVariant::Remote),
            Err(MutationError::ProviderNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn mutation_errors_map_to_codes() {
        let envelope = ErrorEnvelope::from(MutationError::PriorityNoProviders { profile: "p".into() });
        assert_eq!(envelope.code.to_string(), "superjson:priority_no_providers");
        assert_eq!(envelope.metadata.get("profile").map(String::as_str), Some("p"));
    }
}
