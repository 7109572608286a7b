//! Property-based tests for email parsing.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::model::EmailAddress;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_domain_name_is_suffix_after_at(
            local in "[a-z0-9._+-]{1,20}",
            domain in "[a-z0-9-]{1,20}(\\.[a-z]{2,6}){0,2}",
        ) {
            let raw = format!("{local}@{domain}");
            let email = EmailAddress::parse(&raw).unwrap();
            prop_assert_eq!(email.local_part(), local.as_str());
            prop_assert_eq!(email.domain_name(), domain.as_str());
            prop_assert_eq!(email.as_str(), raw.as_str());
        }

        #[test]
        fn test_values_without_at_never_parse(s in "[^@]*") {
            prop_assert!(EmailAddress::parse(&s).is_none());
        }

        #[test]
        fn test_parsed_parts_are_never_empty(s in "\\PC*") {
            if let Some(email) = EmailAddress::parse(&s) {
                prop_assert!(!email.local_part().is_empty());
                prop_assert!(!email.domain_name().is_empty());
                prop_assert!(!email.domain_name().contains('@'));
            }
        }
    }
}
