//! Identifier classification and message identity helpers.

use crate::member::{is_set, ConsumerMember, ObjectType, ProducerMember};
use uuid::Uuid;

/// Object type of a consumer: `SUBSYSTEM` when a subsystem code is set,
/// `MEMBER` otherwise.
pub fn consumer_object_type(consumer: &ConsumerMember) -> ObjectType {
    if is_set(&consumer.subsystem_code) {
        ObjectType::Subsystem
    } else {
        ObjectType::Member
    }
}

/// Object type of a producer: `SERVICE` when a member class is set,
/// `CENTRALSERVICE` otherwise.
pub fn producer_object_type(producer: &ProducerMember) -> ObjectType {
    if is_set(&producer.member_class) {
        ObjectType::Service
    } else {
        ObjectType::CentralService
    }
}

/// A fresh random request id in canonical UUID text form.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parse a signed decimal integer, yielding 0 on anything malformed.
pub fn str_to_int(source: Option<&str>) -> i32 {
    source.and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// `true` only for a case-insensitive "true".
pub fn str_to_bool(source: Option<&str>) -> bool {
    source.is_some_and(|s| s.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_consumer_member_without_subsystem() {
        let consumer = ConsumerMember::new("FI", "GOV", "1234");
        assert_eq!(consumer_object_type(&consumer), ObjectType::Member);
    }

    #[test]
    fn test_consumer_member_with_empty_subsystem() {
        let mut consumer = ConsumerMember::new("FI", "GOV", "1234");
        consumer.subsystem_code = Some(String::new());
        assert_eq!(consumer_object_type(&consumer), ObjectType::Member);
    }

    #[test]
    fn test_consumer_subsystem() {
        let consumer = ConsumerMember::new("FI", "GOV", "1234").with_subsystem("sub1");
        assert_eq!(consumer_object_type(&consumer), ObjectType::Subsystem);
        assert_eq!(consumer.object_type(), ObjectType::Subsystem);
    }

    #[test]
    fn test_producer_central_service() {
        let producer = ProducerMember::central("FI", "getCompanies");
        assert_eq!(producer_object_type(&producer), ObjectType::CentralService);

        let mut blank_class = ProducerMember::new("FI", "GOV", "1234", "getRandom");
        blank_class.member_class = Some(String::new());
        assert_eq!(producer_object_type(&blank_class), ObjectType::CentralService);
    }

    #[test]
    fn test_producer_service() {
        let producer = ProducerMember::new("FI", "GOV", "1234", "getRandom");
        assert_eq!(producer_object_type(&producer), ObjectType::Service);
        assert_eq!(producer.object_type(), ObjectType::Service);
    }

    #[test]
    fn test_str_to_int() {
        assert_eq!(str_to_int(Some("42")), 42);
        assert_eq!(str_to_int(Some("-7")), -7);
        assert_eq!(str_to_int(Some("abc")), 0);
        assert_eq!(str_to_int(Some("")), 0);
        assert_eq!(str_to_int(Some(" 42")), 0);
        assert_eq!(str_to_int(Some("99999999999")), 0);
        assert_eq!(str_to_int(None), 0);
    }

    #[test]
    fn test_str_to_bool() {
        assert!(str_to_bool(Some("TRUE")));
        assert!(str_to_bool(Some("true")));
        assert!(str_to_bool(Some("True")));
        assert!(!str_to_bool(Some("false")));
        assert!(!str_to_bool(Some("yes")));
        assert!(!str_to_bool(Some("")));
        assert!(!str_to_bool(None));
    }

    #[test]
    fn test_generate_id_format() {
        let id = generate_id();
        assert_eq!(id.len(), 36);
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.hyphenated().to_string(), id);
        for (i, c) in id.chars().enumerate() {
            if [8, 13, 18, 23].contains(&i) {
                assert_eq!(c, '-');
            } else {
                assert!(c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
            }
        }
    }

    #[test]
    fn test_generate_id_unique() {
        let ids: HashSet<String> = (0..10_000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
