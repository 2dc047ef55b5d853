// ── Request row ──
//
// One candidate ACL rule being drafted, plus the field vocabulary the form
// controller and the validators share.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use aclflow_api::{AclRequestPayload, RecordId};

/// System type that unlocks free-text entry for every field.
pub const OTHERS: &str = "Others";

/// System type given to rows loaded from a template.
pub const TEMPLATE: &str = "Template";

/// Requested firewall action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Action {
    Allow,
    Deny,
}

/// Addressable row fields. Names match the backend's request body keys.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum RowField {
    #[serde(rename = "system_type", alias = "systemType")]
    #[strum(to_string = "system_type", serialize = "systemType", serialize = "system-type")]
    SystemType,
    #[serde(rename = "category")]
    #[strum(to_string = "category")]
    Category,
    #[serde(rename = "sourceIP", alias = "source_ip")]
    #[strum(to_string = "sourceIP", serialize = "source_ip", serialize = "source-ip")]
    SourceIp,
    #[serde(rename = "sourceHost", alias = "source_host")]
    #[strum(to_string = "sourceHost", serialize = "source_host", serialize = "source-host")]
    SourceHost,
    #[serde(rename = "sourceIPId", alias = "source_option_id")]
    #[strum(to_string = "sourceIPId", serialize = "source_option_id", serialize = "source-id")]
    SourceOptionId,
    #[serde(rename = "destinationIP", alias = "destination_ip")]
    #[strum(
        to_string = "destinationIP",
        serialize = "destination_ip",
        serialize = "destination-ip"
    )]
    DestinationIp,
    #[serde(rename = "destinationHost", alias = "destination_host")]
    #[strum(
        to_string = "destinationHost",
        serialize = "destination_host",
        serialize = "destination-host"
    )]
    DestinationHost,
    #[serde(rename = "destinationIPId", alias = "destination_option_id")]
    #[strum(
        to_string = "destinationIPId",
        serialize = "destination_option_id",
        serialize = "destination-id"
    )]
    DestinationOptionId,
    #[serde(rename = "service")]
    #[strum(to_string = "service")]
    Service,
    #[serde(rename = "description")]
    #[strum(to_string = "description")]
    Description,
    #[serde(rename = "action")]
    #[strum(to_string = "action")]
    Action,
}

impl RowField {
    /// Fields whose auto-populated marker is tracked.
    pub const AUTO_FILLABLE: [Self; 6] = [
        Self::SourceIp,
        Self::SourceHost,
        Self::DestinationIp,
        Self::DestinationHost,
        Self::Service,
        Self::Description,
    ];

    pub fn is_auto_fillable(self) -> bool {
        Self::AUTO_FILLABLE.contains(&self)
    }
}

/// Which end of a flow an endpoint sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Source,
    Destination,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Destination,
            Self::Destination => Self::Source,
        }
    }

    pub fn ip_field(self) -> RowField {
        match self {
            Self::Source => RowField::SourceIp,
            Self::Destination => RowField::DestinationIp,
        }
    }

    pub fn host_field(self) -> RowField {
        match self {
            Self::Source => RowField::SourceHost,
            Self::Destination => RowField::DestinationHost,
        }
    }
}

/// Where a template-loaded row came from. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOrigin {
    pub template_name: String,
    pub original_system_type: String,
}

/// One ACL rule draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclRequestRow {
    #[serde(alias = "systemType")]
    pub system_type: String,
    pub category: String,
    #[serde(alias = "sourceIP")]
    pub source_ip: String,
    #[serde(alias = "sourceHost")]
    pub source_host: String,
    #[serde(alias = "sourceIPId")]
    pub source_option_id: Option<RecordId>,
    #[serde(alias = "destinationIP")]
    pub destination_ip: String,
    #[serde(alias = "destinationHost")]
    pub destination_host: String,
    #[serde(alias = "destinationIPId")]
    pub destination_option_id: Option<RecordId>,
    pub service: String,
    pub description: String,
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_origin: Option<TemplateOrigin>,
}

impl AclRequestRow {
    /// `true` under "Others": every field is free text and catalog
    /// matching is off.
    pub fn is_others(&self) -> bool {
        self.system_type == OTHERS
    }

    /// `true` for rows loaded from a template.
    pub fn is_template(&self) -> bool {
        self.system_type == TEMPLATE || self.template_origin.is_some()
    }

    /// Category is free text (not constrained by the catalog).
    pub fn has_free_category(&self) -> bool {
        self.is_others() || self.is_template()
    }

    /// Text value of a field. Option ids render as their key; a missing
    /// action is empty.
    pub fn get(&self, field: RowField) -> String {
        match field {
            RowField::SystemType => self.system_type.clone(),
            RowField::Category => self.category.clone(),
            RowField::SourceIp => self.source_ip.clone(),
            RowField::SourceHost => self.source_host.clone(),
            RowField::SourceOptionId => self
                .source_option_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            RowField::DestinationIp => self.destination_ip.clone(),
            RowField::DestinationHost => self.destination_host.clone(),
            RowField::DestinationOptionId => self
                .destination_option_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            RowField::Service => self.service.clone(),
            RowField::Description => self.description.clone(),
            RowField::Action => self.action.map(|a| a.to_string()).unwrap_or_default(),
        }
    }

    /// Store a raw value. An action that does not parse clears the action,
    /// and an empty option id clears the selection.
    pub fn set(&mut self, field: RowField, value: &str) {
        let id = || (!value.is_empty()).then(|| RecordId::new(value));
        match field {
            RowField::SystemType => value.clone_into(&mut self.system_type),
            RowField::Category => value.clone_into(&mut self.category),
            RowField::SourceIp => value.clone_into(&mut self.source_ip),
            RowField::SourceHost => value.clone_into(&mut self.source_host),
            RowField::SourceOptionId => self.source_option_id = id(),
            RowField::DestinationIp => value.clone_into(&mut self.destination_ip),
            RowField::DestinationHost => value.clone_into(&mut self.destination_host),
            RowField::DestinationOptionId => self.destination_option_id = id(),
            RowField::Service => value.clone_into(&mut self.service),
            RowField::Description => value.clone_into(&mut self.description),
            RowField::Action => self.action = value.trim().parse().ok(),
        }
    }

    pub(crate) fn set_option_id(&mut self, direction: Direction, id: Option<RecordId>) {
        match direction {
            Direction::Source => self.source_option_id = id,
            Direction::Destination => self.destination_option_id = id,
        }
    }

    /// Body for the validation and creation endpoints. An empty
    /// description is sent as `"ACL Request"` when `for_create` is set.
    pub fn to_payload(&self, for_create: bool) -> AclRequestPayload {
        let description = if for_create && self.description.trim().is_empty() {
            "ACL Request".to_owned()
        } else {
            self.description.clone()
        };
        AclRequestPayload {
            system_type: self.system_type.clone(),
            category: self.category.clone(),
            source_ip: self.source_ip.clone(),
            source_host: self.source_host.clone(),
            destination_ip: self.destination_ip.clone(),
            destination_host: self.destination_host.clone(),
            service: self.service.clone(),
            description,
            action: self.action.map(|a| a.to_string()).unwrap_or_default(),
        }
    }
}
