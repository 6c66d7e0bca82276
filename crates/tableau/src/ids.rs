//! Composite resource identifiers.
//!
//! | Resource | Format |
//! |----------|--------|
//! | single grant | `<type>/<id>/permissions/<users\|groups>/<entityID>/<capability>/<mode>` |
//! | default single grant | `projects/<p>/default_permissions/<users\|groups>/<entityID>/<target>/<capability>/<mode>` |
//! | project permission set | `projects/<p>/permissions` |
//! | default permission set | `projects/<p>/default-permissions/<target>` |
//!
//! `<type>` is one of `projects`, `workbooks`, `datasources`, `views` or
//! `virtualConnections`.

use crate::error::{Error, Result};
use crate::permissions::{DefaultTarget, PermissionTarget};
use grants::{Capability, CapabilityMode, Grantee};
use std::fmt;
use std::str::FromStr;

fn segments(id: &str, expected: usize, layout: &str) -> Result<Vec<String>> {
    let parts: Vec<String> = id.split('/').map(str::to_string).collect();
    if parts.len() != expected {
        return Err(Error::invalid_id(
            id,
            format!("expected {expected} segments ({layout}), got {}", parts.len()),
        ));
    }
    if let Some(pos) = parts.iter().position(String::is_empty) {
        return Err(Error::invalid_id(id, format!("segment {} is empty", pos + 1)));
    }
    Ok(parts)
}

fn expect_literal(id: &str, actual: &str, expected: &str) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::invalid_id(id, format!("expected '{expected}', got '{actual}'")))
    }
}

fn parse_grantee(id: &str, entity_type: &str, entity_id: &str) -> Result<Grantee> {
    Grantee::from_entity(entity_type, entity_id).map_err(|e| Error::invalid_id(id, e.to_string()))
}

fn parse_capability(id: &str, name: &str, mode: &str) -> Result<Capability> {
    let mode: CapabilityMode = mode.parse().map_err(|e: grants::GrantError| Error::invalid_id(id, e.to_string()))?;
    Ok(Capability::new(name, mode))
}

/// ID of a single `(grantee, capability, mode)` grant on one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantId {
    pub target: PermissionTarget,
    pub grantee: Grantee,
    pub capability: Capability,
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grantee = format!("{}/{}", self.grantee.entity_type(), self.grantee.id());
        let capability = format!("{}/{}", self.capability.name, self.capability.mode);
        match &self.target {
            PermissionTarget::ProjectDefault { project_id, target } => {
                write!(f, "projects/{project_id}/default_permissions/{grantee}/{target}/{capability}")
            }
            other => write!(
                f,
                "{}/{}/permissions/{grantee}/{capability}",
                other.id_segment(),
                other.object_id()
            ),
        }
    }
}

impl FromStr for GrantId {
    type Err = Error;

    fn from_str(id: &str) -> Result<Self> {
        if id.split('/').nth(2) == Some("default_permissions") {
            let p = segments(
                id,
                8,
                "projects/<p>/default_permissions/<entityType>/<entityID>/<target>/<capability>/<mode>",
            )?;
            expect_literal(id, &p[0], "projects")?;
            let target = p[5]
                .parse::<DefaultTarget>()
                .map_err(|e| Error::invalid_id(id, e.to_string()))?;
            return Ok(Self {
                target: PermissionTarget::ProjectDefault {
                    project_id: p[1].clone(),
                    target,
                },
                grantee: parse_grantee(id, &p[3], &p[4])?,
                capability: parse_capability(id, &p[6], &p[7])?,
            });
        }

        let p = segments(
            id,
            7,
            "<type>/<id>/permissions/<entityType>/<entityID>/<capability>/<mode>",
        )?;
        let target = PermissionTarget::from_segment(&p[0], p[1].clone())
            .ok_or_else(|| Error::invalid_id(id, format!("unknown content type '{}'", p[0])))?;
        expect_literal(id, &p[2], "permissions")?;
        Ok(Self {
            target,
            grantee: parse_grantee(id, &p[3], &p[4])?,
            capability: parse_capability(id, &p[5], &p[6])?,
        })
    }
}

/// ID of a whole project permission set or default permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSetId {
    pub target: PermissionTarget,
}

impl PermissionSetId {
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            target: PermissionTarget::Project(project_id.into()),
        }
    }

    pub fn project_default(project_id: impl Into<String>, target: DefaultTarget) -> Self {
        Self {
            target: PermissionTarget::ProjectDefault {
                project_id: project_id.into(),
                target,
            },
        }
    }
}

impl fmt::Display for PermissionSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            PermissionTarget::ProjectDefault { project_id, target } => {
                write!(f, "projects/{project_id}/default-permissions/{target}")
            }
            other => write!(f, "{}/{}/permissions", other.id_segment(), other.object_id()),
        }
    }
}

impl FromStr for PermissionSetId {
    type Err = Error;

    fn from_str(id: &str) -> Result<Self> {
        match id.split('/').count() {
            3 => {
                let p = segments(id, 3, "projects/<p>/permissions")?;
                expect_literal(id, &p[0], "projects")?;
                expect_literal(id, &p[2], "permissions")?;
                Ok(Self::project(p[1].clone()))
            }
            4 => {
                let p = segments(id, 4, "projects/<p>/default-permissions/<target>")?;
                expect_literal(id, &p[0], "projects")?;
                expect_literal(id, &p[2], "default-permissions")?;
                let target = p[3]
                    .parse::<DefaultTarget>()
                    .map_err(|e| Error::invalid_id(id, e.to_string()))?;
                Ok(Self::project_default(p[1].clone(), target))
            }
            n => Err(Error::invalid_id(
                id,
                format!("expected 3 or 4 segments, got {n}"),
            )),
        }
    }
}
