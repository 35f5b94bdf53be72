//! Party identifiers: the consumer (client) and producer (service) of a
//! request, and the derived protocol object type.
//!
//! Optional fields are plain `Option<String>`. Builders normalise an empty
//! string to `None`, and classification treats `Some("")` as unset as well,
//! so both spellings of "not set" behave the same.

use crate::error::ClientError;
use std::fmt;
use std::str::FromStr;

/// Protocol-level tag of an identifier.
///
/// Never set by callers; always derived from the populated fields of the
/// owning identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Member,
    Subsystem,
    /// Security server
    Server,
    GlobalGroup,
    LocalGroup,
    SecurityCategory,
    Service,
    CentralService,
}

impl ObjectType {
    /// Value of the `id:objectType` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "MEMBER",
            Self::Subsystem => "SUBSYSTEM",
            Self::Server => "SERVER",
            Self::GlobalGroup => "GLOBALGROUP",
            Self::LocalGroup => "LOCALGROUP",
            Self::SecurityCategory => "SECURITYCATEGORY",
            Self::Service => "SERVICE",
            Self::CentralService => "CENTRALSERVICE",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Some(non-empty) or None.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub(crate) fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// The calling party of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerMember {
    pub x_road_instance: String,
    pub member_class: String,
    pub member_code: String,
    pub subsystem_code: Option<String>,
}

impl ConsumerMember {
    pub fn new(
        x_road_instance: impl Into<String>,
        member_class: impl Into<String>,
        member_code: impl Into<String>,
    ) -> Self {
        Self {
            x_road_instance: x_road_instance.into(),
            member_class: member_class.into(),
            member_code: member_code.into(),
            subsystem_code: None,
        }
    }

    pub fn with_subsystem(mut self, subsystem_code: impl Into<String>) -> Self {
        self.subsystem_code = non_empty(Some(subsystem_code.into()));
        self
    }

    /// `MEMBER` without a subsystem code, `SUBSYSTEM` with one.
    pub fn object_type(&self) -> ObjectType {
        crate::helper::consumer_object_type(self)
    }
}

impl fmt::Display for ConsumerMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.x_road_instance, self.member_class, self.member_code
        )?;
        if let Some(subsystem) = self.subsystem_code.as_deref().filter(|s| !s.is_empty()) {
            write!(f, ":{}", subsystem)?;
        }
        Ok(())
    }
}

/// Parses `INSTANCE/CLASS/CODE[/SUBSYSTEM]`.
impl FromStr for ConsumerMember {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_identifier(s)?;
        match parts.as_slice() {
            [instance, class, code] => Ok(Self::new(*instance, *class, *code)),
            [instance, class, code, subsystem] => {
                Ok(Self::new(*instance, *class, *code).with_subsystem(*subsystem))
            }
            _ => Err(ClientError::Protocol(format!(
                "Consumer identifier '{}' must have 3 or 4 parts",
                s
            ))),
        }
    }
}

/// The service being invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerMember {
    pub x_road_instance: String,
    /// Absent for central services
    pub member_class: Option<String>,
    pub member_code: String,
    pub subsystem_code: Option<String>,
    pub service_code: String,
    pub service_version: Option<String>,
    /// Namespace of the service's request/response elements
    pub namespace_url: Option<String>,
    /// Prefix bound to `namespace_url` when serializing
    pub namespace_prefix: Option<String>,
}

impl ProducerMember {
    /// A service provided by a specific member.
    pub fn new(
        x_road_instance: impl Into<String>,
        member_class: impl Into<String>,
        member_code: impl Into<String>,
        service_code: impl Into<String>,
    ) -> Self {
        Self {
            x_road_instance: x_road_instance.into(),
            member_class: non_empty(Some(member_class.into())),
            member_code: member_code.into(),
            subsystem_code: None,
            service_code: service_code.into(),
            service_version: None,
            namespace_url: None,
            namespace_prefix: None,
        }
    }

    /// A central service, resolved by the central server rather than a member.
    pub fn central(x_road_instance: impl Into<String>, service_code: impl Into<String>) -> Self {
        Self {
            x_road_instance: x_road_instance.into(),
            member_class: None,
            member_code: String::new(),
            subsystem_code: None,
            service_code: service_code.into(),
            service_version: None,
            namespace_url: None,
            namespace_prefix: None,
        }
    }

    pub fn with_subsystem(mut self, subsystem_code: impl Into<String>) -> Self {
        self.subsystem_code = non_empty(Some(subsystem_code.into()));
        self
    }

    pub fn with_version(mut self, service_version: impl Into<String>) -> Self {
        self.service_version = non_empty(Some(service_version.into()));
        self
    }

    pub fn with_namespace(mut self, url: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.namespace_url = non_empty(Some(url.into()));
        self.namespace_prefix = non_empty(Some(prefix.into()));
        self
    }

    /// `CENTRALSERVICE` without a member class, `SERVICE` with one.
    pub fn object_type(&self) -> ObjectType {
        crate::helper::producer_object_type(self)
    }

    pub fn is_central_service(&self) -> bool {
        self.object_type() == ObjectType::CentralService
    }
}

impl fmt::Display for ProducerMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = vec![&self.x_road_instance];
        if let Some(class) = self.member_class.as_deref().filter(|c| !c.is_empty()) {
            parts.push(class);
            parts.push(&self.member_code);
        }
        if let Some(subsystem) = self.subsystem_code.as_deref().filter(|s| !s.is_empty()) {
            parts.push(subsystem);
        }
        parts.push(&self.service_code);
        if let Some(version) = self.service_version.as_deref().filter(|v| !v.is_empty()) {
            parts.push(version);
        }
        f.write_str(&parts.join(":"))
    }
}

/// Parses one of:
///
/// - `INSTANCE/SERVICE` (central service)
/// - `INSTANCE/CLASS/CODE/SERVICE`
/// - `INSTANCE/CLASS/CODE/SUBSYSTEM/SERVICE`
/// - `INSTANCE/CLASS/CODE/SUBSYSTEM/SERVICE/VERSION`
impl FromStr for ProducerMember {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_identifier(s)?;
        match parts.as_slice() {
            [instance, service] => Ok(Self::central(*instance, *service)),
            [instance, class, code, service] => Ok(Self::new(*instance, *class, *code, *service)),
            [instance, class, code, subsystem, service] => {
                Ok(Self::new(*instance, *class, *code, *service).with_subsystem(*subsystem))
            }
            [instance, class, code, subsystem, service, version] => {
                Ok(Self::new(*instance, *class, *code, *service)
                    .with_subsystem(*subsystem)
                    .with_version(*version))
            }
            _ => Err(ClientError::Protocol(format!(
                "Service identifier '{}' must have 2, 4, 5 or 6 parts",
                s
            ))),
        }
    }
}

fn split_identifier(s: &str) -> Result<Vec<&str>, ClientError> {
    let parts: Vec<&str> = s.trim().split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ClientError::Protocol(format!(
            "Identifier '{}' contains an empty part",
            s
        )));
    }
    Ok(parts)
}
