//! # Database Driver
//!
//! Converges `RDBDatabase` objects with logical databases on their instance.

use async_trait::async_trait;
use kube::ResourceExt;

use crate::crd::{RDBDatabase, RDBDatabaseStatus};
use crate::manager::rdb::{instance_owner, resolve_instance_ref, validate_instance_ref};
use crate::manager::{FieldError, FieldErrorList, Manager, ManagerError, Owner};
use crate::scaleway::types::{CreateDatabaseRequest, Database};
use crate::scaleway::{self, RdbApi};

/// Driver for `RDBDatabase` resources
pub struct DatabaseManager {
    client: kube::Client,
    api: RdbApi,
}

impl DatabaseManager {
    pub fn new(client: kube::Client, api: RdbApi) -> Self {
        Self { client, api }
    }

    /// Database name on the instance: the override name when set, the object
    /// name otherwise
    fn database_name(database: &RDBDatabase) -> String {
        if database.spec.override_name.is_empty() {
            database.name_any()
        } else {
            database.spec.override_name.clone()
        }
    }

    async fn get_by_name(
        &self,
        region: &str,
        instance_id: &str,
        name: &str,
    ) -> Result<Option<Database>, ManagerError> {
        let databases = match self.api.list_databases(region, instance_id, Some(name)).await {
            Ok(databases) => databases,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(databases.into_iter().find(|database| database.name == name))
    }
}

#[async_trait]
impl Manager<RDBDatabase> for DatabaseManager {
    async fn ensure(&self, database: &mut RDBDatabase) -> Result<bool, ManagerError> {
        let namespace = database.namespace().unwrap_or_default();
        let (instance_id, region) =
            resolve_instance_ref(&self.client, &database.spec.instance_ref, &namespace).await?;

        let name = Self::database_name(database);

        let observed = match self.get_by_name(&region, &instance_id, &name).await? {
            Some(observed) => observed,
            None => {
                self.api
                    .create_database(&region, &instance_id, &CreateDatabaseRequest { name })
                    .await?
            }
        };

        let status = database
            .status
            .get_or_insert_with(RDBDatabaseStatus::default);
        status.managed = observed.managed;
        status.owner = observed.owner;
        status.size = Some(observed.size.to_string());

        Ok(true)
    }

    async fn delete(&self, database: &mut RDBDatabase) -> Result<bool, ManagerError> {
        let namespace = database.namespace().unwrap_or_default();
        let (instance_id, region) =
            resolve_instance_ref(&self.client, &database.spec.instance_ref, &namespace).await?;

        let name = Self::database_name(database);

        match self.api.delete_database(&region, &instance_id, &name).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(true),
            Err(err) => Err(err.into()),
        }
    }

    async fn get_owners(&self, database: &RDBDatabase) -> Result<Vec<Owner>, ManagerError> {
        let namespace = database.namespace().unwrap_or_default();
        instance_owner(&self.client, &database.spec.instance_ref, &namespace).await
    }

    async fn validate_create(&self, database: &RDBDatabase) -> Result<FieldErrorList, ManagerError> {
        let reference = &database.spec.instance_ref;

        let errors = validate_instance_ref(reference, "spec.instanceRef");
        if !errors.is_empty() {
            return Ok(errors);
        }

        if !reference.external_id.is_empty() || !reference.region.is_empty() {
            if !reference.region.is_empty() && scaleway::parse_region(&reference.region).is_none() {
                return Ok(vec![FieldError::invalid(
                    "spec.instanceRef.region",
                    "region is not valid",
                )]);
            }

            if let Err(err) = self
                .api
                .get_instance(&reference.region, &reference.external_id)
                .await
            {
                return Ok(vec![FieldError::invalid(
                    "spec.instanceRef.externalID",
                    err.to_string(),
                )]);
            }
        }

        Ok(Vec::new())
    }

    async fn validate_update(
        &self,
        old: &RDBDatabase,
        new: &RDBDatabase,
    ) -> Result<FieldErrorList, ManagerError> {
        let mut errors = Vec::new();

        if old.spec.override_name != new.spec.override_name {
            errors.push(FieldError::forbidden("spec.overrideName", "field is immutable"));
        }

        if old.spec.instance_ref.region != new.spec.instance_ref.region {
            errors.push(FieldError::forbidden(
                "spec.instanceRef.region",
                "field is immutable",
            ));
        }

        if old.spec.instance_ref.external_id != new.spec.instance_ref.external_id {
            errors.push(FieldError::forbidden(
                "spec.instanceRef.externalID",
                "field is immutable",
            ));
        }

        if old.spec.instance_ref.name != new.spec.instance_ref.name {
            errors.push(FieldError::forbidden(
                "spec.instanceRef.name",
                "field is immutable",
            ));
        }

        if old.spec.instance_ref.namespace != new.spec.instance_ref.namespace {
            errors.push(FieldError::forbidden(
                "spec.instanceRef.namespace",
                "field is immutable",
            ));
        }

        Ok(errors)
    }
}
