//! Per-request resolution contexts.

use std::collections::HashMap;

use idp_attribute::Attribute;

/// The per-request input to the attribute resolver, mutated to carry the
/// final resolved attribute set back to the caller.
///
/// One instance is created and consumed within a single resolution call;
/// it is never shared across requests.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    /// The resolved principal this request is about.
    principal: Option<String>,
    /// The attribute issuer (this IdP).
    attribute_issuer_id: Option<String>,
    /// The attribute recipient (the relying party).
    attribute_recipient_id: Option<String>,
    /// How the principal was authenticated.
    principal_authn_method: Option<String>,
    /// Attribute ids the caller asked for. A hint only, never a contract.
    requested_attribute_ids: Vec<String>,
    /// Final resolved attributes, written by the engine.
    resolved_attributes: HashMap<String, Attribute>,
}

impl ResolutionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the principal associated with this resolution.
    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Sets the principal associated with this resolution.
    pub fn set_principal(&mut self, principal: impl Into<String>) {
        self.principal = Some(principal.into());
    }

    /// Returns the attribute issuer identity.
    #[must_use]
    pub fn attribute_issuer_id(&self) -> Option<&str> {
        self.attribute_issuer_id.as_deref()
    }

    /// Sets the attribute issuer identity.
    pub fn set_attribute_issuer_id(&mut self, issuer: impl Into<String>) {
        self.attribute_issuer_id = Some(issuer.into());
    }

    /// Returns the attribute recipient identity.
    #[must_use]
    pub fn attribute_recipient_id(&self) -> Option<&str> {
        self.attribute_recipient_id.as_deref()
    }

    /// Sets the attribute recipient identity.
    pub fn set_attribute_recipient_id(&mut self, recipient: impl Into<String>) {
        self.attribute_recipient_id = Some(recipient.into());
    }

    /// Returns how the principal was authenticated.
    #[must_use]
    pub fn principal_authn_method(&self) -> Option<&str> {
        self.principal_authn_method.as_deref()
    }

    /// Sets how the principal was authenticated.
    pub fn set_principal_authn_method(&mut self, method: impl Into<String>) {
        self.principal_authn_method = Some(method.into());
    }

    /// Returns the attribute ids the caller asked for.
    #[must_use]
    pub fn requested_attribute_ids(&self) -> &[String] {
        &self.requested_attribute_ids
    }

    /// Sets the attribute ids the caller asks for.
    ///
    /// Blank entries and duplicates are dropped.
    pub fn set_requested_attribute_ids<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = std::collections::HashSet::new();
        self.requested_attribute_ids = ids
            .into_iter()
            .map(Into::into)
            .filter(|id| !id.trim().is_empty())
            .filter(|id| seen.insert(id.clone()))
            .collect();
    }

    /// Returns the final resolved attributes.
    ///
    /// Empty until a resolution call completes.
    #[must_use]
    pub fn resolved_attributes(&self) -> &HashMap<String, Attribute> {
        &self.resolved_attributes
    }

    /// Replaces the final resolved attribute set.
    ///
    /// Called by the engine when finalizing a resolution pass.
    pub fn set_resolved_attributes(&mut self, attributes: impl IntoIterator<Item = Attribute>) {
        self.resolved_attributes = attributes
            .into_iter()
            .map(|attribute| (attribute.id().to_string(), attribute))
            .collect();
    }
}

/// Input to principal canonicalization: the inbound subject identity and
/// the parties involved in the exchange.
#[derive(Debug, Clone)]
pub struct CanonicalizationContext {
    /// The inbound subject name to canonicalize.
    subject_name: String,
    /// Format qualifier of the subject name, if the protocol carries one.
    format: Option<String>,
    /// The asserting party.
    issuer: Option<String>,
    /// The requesting party.
    requester: Option<String>,
}

impl CanonicalizationContext {
    /// Creates a context for the given inbound subject name.
    #[must_use]
    pub fn new(subject_name: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
            format: None,
            issuer: None,
            requester: None,
        }
    }

    /// Sets the subject name format qualifier.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the asserting party.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the requesting party.
    #[must_use]
    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }

    /// Returns the inbound subject name.
    #[must_use]
    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    /// Returns the subject name format qualifier.
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Returns the asserting party.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Returns the requesting party.
    #[must_use]
    pub fn requester(&self) -> Option<&str> {
        self.requester.as_deref()
    }
}
