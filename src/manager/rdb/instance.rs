//! # Instance Driver
//!
//! Converges `RDBInstance` objects with their backing database instances.
//!
//! At most one corrective API call is made per pass (tags/backup update, then
//! HA/node-type upgrade); the next divergence is discovered on the following
//! pass. ACL rules are converged once update and upgrade found nothing to do.

use std::net::IpAddr;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams, PostParams};
use kube::ResourceExt;
use tracing::warn;

use crate::crd::{RDBInstance, RDBInstanceStatus, RDBACL};
use crate::manager::{FieldError, FieldErrorList, Manager, ManagerError, Owner};
use crate::scaleway::types::{
    AclRule, AclRuleRequest, CloneInstanceRequest, CreateInstanceRequest, InstanceStatus,
    SetAclRulesRequest, UpdateInstanceRequest, UpgradeInstanceRequest,
};
use crate::scaleway::{self, RdbApi};
use crate::utils::labels::{compare_tags_labels, labels_to_tags};

/// Driver for `RDBInstance` resources
pub struct InstanceManager {
    client: kube::Client,
    api: RdbApi,
}

impl InstanceManager {
    pub fn new(client: kube::Client, api: RdbApi) -> Self {
        Self { client, api }
    }

    async fn create_instance(&self, instance: &mut RDBInstance) -> Result<(), ManagerError> {
        let name = instance.name_any();
        let namespace = instance.namespace().unwrap_or_default();

        let created = if let Some(instance_from) = instance.spec.instance_from.clone() {
            let (source_id, source_region) = super::resolve_instance_ref(
                &self.client,
                &instance_from,
                &namespace,
            )
            .await?;
            self.api
                .clone_instance(
                    &source_region,
                    &source_id,
                    &CloneInstanceRequest {
                        name,
                        node_type: Some(instance.spec.node_type.clone()),
                    },
                )
                .await?
        } else {
            let disable_backup = instance
                .spec
                .auto_backup
                .as_ref()
                .map_or(true, |b| b.disabled);

            self.api
                .create_instance(
                    &instance.spec.region,
                    &CreateInstanceRequest {
                        name,
                        engine: instance.spec.engine.clone(),
                        node_type: instance.spec.node_type.clone(),
                        is_ha_cluster: instance.spec.is_ha_cluster,
                        disable_backup,
                        tags: labels_to_tags(instance.labels()),
                    },
                )
                .await?
        };

        instance.spec.instance_id = created.id;
        instance.spec.region = created.region;

        // Record the created instance ID on the object before anything else
        // can happen to this pass.
        let api: Api<RDBInstance> = Api::namespaced(self.client.clone(), &namespace);
        let name = instance.name_any();
        let updated = api.replace(&name, &PostParams::default(), instance).await?;
        *instance = updated;

        Ok(())
    }

    /// Converge tags and backup schedule. Returns true if a corrective call
    /// was made, ending the pass.
    async fn update_instance(
        &self,
        instance: &RDBInstance,
        observed: &scaleway::types::Instance,
    ) -> Result<bool, ManagerError> {
        let mut needs_update = false;
        let mut request = UpdateInstanceRequest::default();

        if !compare_tags_labels(&observed.tags, instance.labels()) {
            request.tags = Some(labels_to_tags(instance.labels()));
            needs_update = true;
        }

        if let (Some(auto_backup), Some(schedule)) =
            (&instance.spec.auto_backup, &observed.backup_schedule)
        {
            if auto_backup.disabled != schedule.disabled {
                request.is_backup_schedule_disabled = Some(auto_backup.disabled);
                needs_update = true;
            }
            if let Some(frequency) = auto_backup.frequency {
                if frequency != schedule.frequency {
                    request.backup_schedule_frequency = Some(frequency);
                    needs_update = true;
                }
            }
            if let Some(retention) = auto_backup.retention {
                if retention != schedule.retention {
                    request.backup_schedule_retention = Some(retention);
                    needs_update = true;
                }
            }
        }

        if needs_update {
            self.api
                .update_instance(&instance.spec.region, &instance.spec.instance_id, &request)
                .await?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Converge HA mode and node type. Returns true if a corrective call was
    /// made, ending the pass.
    async fn upgrade_instance(
        &self,
        instance: &RDBInstance,
        observed: &scaleway::types::Instance,
    ) -> Result<bool, ManagerError> {
        if observed.is_ha_cluster != instance.spec.is_ha_cluster {
            self.api
                .upgrade_instance(
                    &instance.spec.region,
                    &instance.spec.instance_id,
                    &UpgradeInstanceRequest {
                        enable_ha: Some(instance.spec.is_ha_cluster),
                        ..Default::default()
                    },
                )
                .await?;
            return Ok(true);
        }

        if observed.node_type != instance.spec.node_type {
            self.api
                .upgrade_instance(
                    &instance.spec.region,
                    &instance.spec.instance_id,
                    &UpgradeInstanceRequest {
                        node_type: Some(instance.spec.node_type.clone()),
                        ..Default::default()
                    },
                )
                .await?;
            return Ok(true);
        }

        Ok(false)
    }

    async fn update_acls(
        &self,
        instance: &RDBInstance,
        acl: &RDBACL,
    ) -> Result<(), ManagerError> {
        let existing = self
            .api
            .list_instance_acl_rules(&instance.spec.region, &instance.spec.instance_id)
            .await?;

        let node_cidrs = if acl.allow_cluster {
            self.nodes_cidrs().await?
        } else {
            Vec::new()
        };

        if !needs_acl_update(acl, &existing, &node_cidrs) {
            return Ok(());
        }

        let mut rules = Vec::new();
        for wanted in &acl.rules {
            match parse_cidr(&wanted.ip_range) {
                Some(cidr) => rules.push(AclRuleRequest {
                    ip: cidr,
                    description: wanted.description.clone(),
                }),
                None => warn!("ignoring ACL rule with invalid ip range: {}", wanted.ip_range),
            }
        }
        for cidr in node_cidrs {
            rules.push(AclRuleRequest {
                ip: cidr,
                description: "Kubernetes node".to_string(),
            });
        }

        self.api
            .set_instance_acl_rules(
                &instance.spec.region,
                &instance.spec.instance_id,
                &SetAclRulesRequest { rules },
            )
            .await?;

        Ok(())
    }

    /// CIDRs of all cluster node addresses (internal and external)
    async fn nodes_cidrs(&self) -> Result<Vec<String>, ManagerError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let node_list = nodes.list(&ListParams::default()).await?;

        let mut cidrs = Vec::new();
        for node in node_list {
            let addresses = node
                .status
                .iter()
                .flat_map(|status| status.addresses.iter().flatten());
            for address in addresses {
                if address.type_ == "ExternalIP" || address.type_ == "InternalIP" {
                    if let Ok(ip) = address.address.parse::<IpAddr>() {
                        cidrs.push(host_cidr(ip));
                    }
                }
            }
        }

        Ok(cidrs)
    }

    async fn check_node_type(&self, region: &str, node_type: &str) -> Result<FieldErrorList, ManagerError> {
        let mut errors = Vec::new();

        let node_types = self.api.list_node_types(region).await?;
        match node_types.iter().find(|n| n.name == node_type) {
            Some(found) if found.disabled => {
                errors.push(FieldError::invalid("spec.nodeType", "node type is disabled"));
            }
            Some(_) => {}
            None => {
                errors.push(FieldError::invalid("spec.nodeType", "node type does not exist"));
            }
        }

        Ok(errors)
    }
}

#[async_trait]
impl Manager<RDBInstance> for InstanceManager {
    async fn ensure(&self, instance: &mut RDBInstance) -> Result<bool, ManagerError> {
        // No instance ID yet: the instance has to be created first
        if instance.spec.instance_id.is_empty() {
            self.create_instance(instance).await?;
            return Ok(false);
        }

        let observed = self
            .api
            .get_instance(&instance.spec.region, &instance.spec.instance_id)
            .await?;

        if self.update_instance(instance, &observed).await? {
            return Ok(false);
        }

        if self.upgrade_instance(instance, &observed).await? {
            return Ok(false);
        }

        if let Some(acl) = instance.spec.acl.clone() {
            self.update_acls(instance, &acl).await?;
        }

        if let Some(endpoint) = &observed.endpoint {
            let status = instance
                .status
                .get_or_insert_with(RDBInstanceStatus::default);
            status.endpoint.ip = endpoint.ip.clone();
            status.endpoint.port = i32::from(endpoint.port);
        }

        Ok(observed.status == InstanceStatus::Ready)
    }

    async fn delete(&self, instance: &mut RDBInstance) -> Result<bool, ManagerError> {
        if instance.spec.instance_id.is_empty() {
            return Ok(true);
        }

        match self
            .api
            .delete_instance(&instance.spec.region, &instance.spec.instance_id)
            .await
        {
            Ok(_) => Ok(false),
            Err(err) if err.is_not_found() => Ok(true),
            Err(err) => Err(err.into()),
        }
    }

    async fn get_owners(&self, _instance: &RDBInstance) -> Result<Vec<Owner>, ManagerError> {
        Ok(Vec::new())
    }

    async fn validate_create(&self, instance: &RDBInstance) -> Result<FieldErrorList, ManagerError> {
        let mut errors = Vec::new();

        if !instance.spec.region.is_empty()
            && scaleway::parse_region(&instance.spec.region).is_none()
        {
            errors.push(FieldError::invalid("spec.region", "region is not valid"));
            // Stop here, API calls with this region would fail anyway
            return Ok(errors);
        }

        if !instance.spec.instance_id.is_empty() {
            match self
                .api
                .get_instance(&instance.spec.region, &instance.spec.instance_id)
                .await
            {
                Ok(observed) => {
                    if observed.engine != instance.spec.engine {
                        errors.push(FieldError::invalid("spec.engine", "engine does not match"));
                    }
                }
                Err(err) => {
                    errors.push(FieldError::invalid("spec.instanceID", err.to_string()));
                }
            }
            return Ok(errors);
        }

        let engines = self.api.list_database_engines(&instance.spec.region).await?;
        let engine_version = engines
            .iter()
            .flat_map(|engine| engine.versions.iter())
            .find(|version| version.name == instance.spec.engine);
        match engine_version {
            Some(version) if version.disabled => {
                errors.push(FieldError::invalid("spec.engine", "engine is disabled"));
            }
            Some(_) => {}
            None => {
                errors.push(FieldError::invalid("spec.engine", "engine does not exist"));
            }
        }

        errors.extend(
            self.check_node_type(&instance.spec.region, &instance.spec.node_type)
                .await?,
        );

        Ok(errors)
    }

    async fn validate_update(
        &self,
        old: &RDBInstance,
        new: &RDBInstance,
    ) -> Result<FieldErrorList, ManagerError> {
        let mut errors = Vec::new();

        if !old.spec.instance_id.is_empty() && old.spec.instance_id != new.spec.instance_id {
            errors.push(FieldError::forbidden("spec.instanceID", "field is immutable"));
        }

        if !old.spec.region.is_empty() && old.spec.region != new.spec.region {
            errors.push(FieldError::forbidden("spec.region", "field is immutable"));
        }

        if old.spec.engine != new.spec.engine {
            errors.push(FieldError::forbidden("spec.engine", "field is immutable"));
        }

        if old.spec.is_ha_cluster != new.spec.is_ha_cluster && old.spec.is_ha_cluster {
            errors.push(FieldError::invalid(
                "spec.isHaCluster",
                "HA instance can't be downgraded",
            ));
        }

        if old.spec.node_type != new.spec.node_type {
            errors.extend(
                self.check_node_type(&new.spec.region, &new.spec.node_type)
                    .await?,
            );
        }

        Ok(errors)
    }
}

/// Normalize a CIDR string, rejecting malformed input
fn parse_cidr(input: &str) -> Option<String> {
    let (ip, prefix) = input.split_once('/')?;
    let ip: IpAddr = ip.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;
    let max = if ip.is_ipv4() { 32 } else { 128 };
    (prefix <= max).then(|| format!("{ip}/{prefix}"))
}

/// Single-host CIDR for a node address
fn host_cidr(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(ip) => format!("{ip}/32"),
        IpAddr::V6(ip) => format!("{ip}/128"),
    }
}

/// Whether the observed ACL rules diverge from the wanted rules plus node CIDRs
fn needs_acl_update(acl: &RDBACL, existing: &[AclRule], node_cidrs: &[String]) -> bool {
    if existing.len() != acl.rules.len() + node_cidrs.len() {
        return true;
    }

    for existing_rule in existing {
        let wanted = acl
            .rules
            .iter()
            .any(|rule| parse_cidr(&rule.ip_range).as_deref() == Some(existing_rule.ip.as_str()));
        let from_node = node_cidrs.iter().any(|cidr| *cidr == existing_rule.ip);
        if !wanted && !from_node {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::RDBACLRule;

    fn acl(rules: &[&str]) -> RDBACL {
        RDBACL {
            rules: rules
                .iter()
                .map(|ip_range| RDBACLRule {
                    ip_range: (*ip_range).to_string(),
                    description: String::new(),
                })
                .collect(),
            allow_cluster: false,
        }
    }

    fn existing(ips: &[&str]) -> Vec<AclRule> {
        ips.iter()
            .map(|ip| AclRule {
                ip: (*ip).to_string(),
                description: String::new(),
            })
            .collect()
    }

    #[test]
    fn parse_cidr_accepts_host_and_range() {
        assert_eq!(parse_cidr("10.0.0.0/8"), Some("10.0.0.0/8".to_string()));
        assert_eq!(parse_cidr("192.168.1.1/32"), Some("192.168.1.1/32".to_string()));
        assert_eq!(parse_cidr("::1/128"), Some("::1/128".to_string()));
        assert_eq!(parse_cidr("10.0.0.1"), None);
        assert_eq!(parse_cidr("10.0.0.1/33"), None);
        assert_eq!(parse_cidr("not-an-ip/8"), None);
    }

    #[test]
    fn acl_update_detects_divergence() {
        let wanted = acl(&["10.0.0.0/8"]);
        assert!(!needs_acl_update(&wanted, &existing(&["10.0.0.0/8"]), &[]));
        assert!(needs_acl_update(&wanted, &existing(&["10.1.0.0/8"]), &[]));
        assert!(needs_acl_update(&wanted, &existing(&[]), &[]));
        assert!(needs_acl_update(&wanted, &existing(&["10.0.0.0/8", "10.1.0.0/8"]), &[]));
    }

    #[test]
    fn acl_update_accounts_for_node_cidrs() {
        let wanted = acl(&["10.0.0.0/8"]);
        let nodes = vec!["192.168.1.1/32".to_string()];
        assert!(!needs_acl_update(
            &wanted,
            &existing(&["10.0.0.0/8", "192.168.1.1/32"]),
            &nodes
        ));
        assert!(needs_acl_update(&wanted, &existing(&["10.0.0.0/8"]), &nodes));
    }
}
