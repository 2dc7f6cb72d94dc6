//! Principal decoder implementations.

use idp_resolver_spi::{
    CanonicalizationContext, PrincipalDecoder, ResolutionError, ResolutionResult,
};
use tracing::debug;

/// A principal decoder that returns the subject name unchanged.
///
/// Decoding succeeds when the subject name format is absent or listed
/// in the accepted formats. An empty accepted list accepts every
/// format.
#[derive(Debug, Default)]
pub struct DirectPrincipalDecoder {
    accepted_formats: Vec<String>,
}

impl DirectPrincipalDecoder {
    /// Creates a decoder accepting every subject name format.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts decoding to the given subject name formats.
    #[must_use]
    pub fn with_accepted_formats(formats: impl IntoIterator<Item = String>) -> Self {
        Self {
            accepted_formats: formats.into_iter().collect(),
        }
    }

    fn accepts(&self, format: Option<&str>) -> bool {
        match format {
            None => true,
            Some(format) => {
                self.accepted_formats.is_empty()
                    || self.accepted_formats.iter().any(|f| f == format)
            }
        }
    }
}

impl PrincipalDecoder for DirectPrincipalDecoder {
    fn canonicalize(
        &self,
        context: &CanonicalizationContext,
    ) -> ResolutionResult<Option<String>> {
        if !self.accepts(context.format()) {
            debug!(
                format = context.format(),
                "subject name format not accepted"
            );
            return Ok(None);
        }
        let subject = context.subject_name().trim();
        if subject.is_empty() {
            return Err(ResolutionError::plugin(
                "direct-principal-decoder",
                "subject name is blank",
            ));
        }
        Ok(Some(subject.to_string()))
    }

    fn has_valid_connectors(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_subject_name_unchanged() {
        let decoder = DirectPrincipalDecoder::new();
        let context = CanonicalizationContext::new("jdoe");
        assert_eq!(decoder.canonicalize(&context).unwrap(), Some("jdoe".to_string()));
    }

    #[test]
    fn unaccepted_format_decodes_to_none() {
        let decoder = DirectPrincipalDecoder::with_accepted_formats([
            "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent".to_string(),
        ]);
        let context = CanonicalizationContext::new("jdoe")
            .with_format("urn:oasis:names:tc:SAML:2.0:nameid-format:transient");
        assert_eq!(decoder.canonicalize(&context).unwrap(), None);
    }

    #[test]
    fn empty_accepted_list_accepts_any_format() {
        let decoder = DirectPrincipalDecoder::new();
        let context = CanonicalizationContext::new("jdoe")
            .with_format("urn:oasis:names:tc:SAML:2.0:nameid-format:transient");
        assert_eq!(decoder.canonicalize(&context).unwrap(), Some("jdoe".to_string()));
    }

    #[test]
    fn blank_subject_name_is_an_error() {
        let decoder = DirectPrincipalDecoder::new();
        assert!(decoder.canonicalize(&CanonicalizationContext::new("  ")).is_err());
    }
}
