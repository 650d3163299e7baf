//! Server error classification.

/// Failure classes reported by the site's batch endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorKind {
    /// Requested folder or file does not exist
    NotFound,
    /// Caller lacks permission for the operation
    AccessDenied,
    /// Storage quota exceeded
    QuotaExceeded,
    /// An object with the same name already exists
    AlreadyExists,
    /// Anything the client does not recognise
    Other,
}

impl ServerErrorKind {
    /// Classify a server-reported error type name.
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "System.IO.FileNotFoundException"
            | "System.IO.DirectoryNotFoundException"
            | "NotFound" => ServerErrorKind::NotFound,
            "System.UnauthorizedAccessException" | "AccessDenied" => {
                ServerErrorKind::AccessDenied
            }
            "Microsoft.SharePoint.SPQuotaExceededException" | "QuotaExceeded" => {
                ServerErrorKind::QuotaExceeded
            }
            "Microsoft.SharePoint.SPDuplicateObjectException" | "AlreadyExists" => {
                ServerErrorKind::AlreadyExists
            }
            _ => ServerErrorKind::Other,
        }
    }

    /// Canonical type name used when the client itself reports the error.
    pub fn type_name(&self) -> &'static str {
        match self {
            ServerErrorKind::NotFound => "NotFound",
            ServerErrorKind::AccessDenied => "AccessDenied",
            ServerErrorKind::QuotaExceeded => "QuotaExceeded",
            ServerErrorKind::AlreadyExists => "AlreadyExists",
            ServerErrorKind::Other => "ServerError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_classification() {
        assert_eq!(
            ServerErrorKind::from_type_name("System.IO.FileNotFoundException"),
            ServerErrorKind::NotFound
        );
        assert_eq!(
            ServerErrorKind::from_type_name("NotFound"),
            ServerErrorKind::NotFound
        );
        assert_eq!(
            ServerErrorKind::from_type_name("System.UnauthorizedAccessException"),
            ServerErrorKind::AccessDenied
        );
        assert_eq!(
            ServerErrorKind::from_type_name("Microsoft.SharePoint.SPQuotaExceededException"),
            ServerErrorKind::QuotaExceeded
        );
        assert_eq!(
            ServerErrorKind::from_type_name("AlreadyExists"),
            ServerErrorKind::AlreadyExists
        );

        // Unknown names, including near misses, stay opaque
        assert_eq!(
            ServerErrorKind::from_type_name("System.IO.IOException"),
            ServerErrorKind::Other
        );
        assert_eq!(
            ServerErrorKind::from_type_name("notfound"),
            ServerErrorKind::Other
        );
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for kind in [
            ServerErrorKind::NotFound,
            ServerErrorKind::AccessDenied,
            ServerErrorKind::QuotaExceeded,
            ServerErrorKind::AlreadyExists,
        ] {
            assert_eq!(ServerErrorKind::from_type_name(kind.type_name()), kind);
        }
        assert_eq!(ServerErrorKind::Other.type_name(), "ServerError");
    }
}
