//! # RDB Product API
//!
//! Operations of the RDB product API used by the resource drivers.
//!
//! All operations take the region explicitly; an empty region falls back to
//! the client's configured default region.

use reqwest::Method;

use crate::scaleway::types::*;
use crate::scaleway::{Client, Error};

/// API for the Scaleway RDB product
#[derive(Debug, Clone)]
pub struct RdbApi {
    client: Client,
}

impl RdbApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn path(&self, region: &str, suffix: &str) -> String {
        format!(
            "/rdb/v1/regions/{}/{}",
            self.client.region_or_default(region),
            suffix
        )
    }

    pub async fn create_instance(
        &self,
        region: &str,
        request: &CreateInstanceRequest,
    ) -> Result<Instance, Error> {
        self.client
            .request(Method::POST, &self.path(region, "instances"), Some(request))
            .await
    }

    pub async fn clone_instance(
        &self,
        region: &str,
        instance_id: &str,
        request: &CloneInstanceRequest,
    ) -> Result<Instance, Error> {
        let path = self.path(region, &format!("instances/{instance_id}/clone"));
        self.client.request(Method::POST, &path, Some(request)).await
    }

    pub async fn get_instance(&self, region: &str, instance_id: &str) -> Result<Instance, Error> {
        let path = self.path(region, &format!("instances/{instance_id}"));
        self.client.request::<(), _>(Method::GET, &path, None).await
    }

    pub async fn update_instance(
        &self,
        region: &str,
        instance_id: &str,
        request: &UpdateInstanceRequest,
    ) -> Result<Instance, Error> {
        let path = self.path(region, &format!("instances/{instance_id}"));
        self.client.request(Method::PATCH, &path, Some(request)).await
    }

    pub async fn upgrade_instance(
        &self,
        region: &str,
        instance_id: &str,
        request: &UpgradeInstanceRequest,
    ) -> Result<Instance, Error> {
        let path = self.path(region, &format!("instances/{instance_id}/upgrade"));
        self.client.request(Method::POST, &path, Some(request)).await
    }

    pub async fn delete_instance(&self, region: &str, instance_id: &str) -> Result<Instance, Error> {
        let path = self.path(region, &format!("instances/{instance_id}"));
        self.client.request::<(), _>(Method::DELETE, &path, None).await
    }

    pub async fn list_instance_acl_rules(
        &self,
        region: &str,
        instance_id: &str,
    ) -> Result<Vec<AclRule>, Error> {
        let path = self.path(
            region,
            &format!("instances/{instance_id}/acls?page_size=100"),
        );
        let response: ListAclRulesResponse =
            self.client.request::<(), _>(Method::GET, &path, None).await?;
        Ok(response.rules)
    }

    pub async fn set_instance_acl_rules(
        &self,
        region: &str,
        instance_id: &str,
        request: &SetAclRulesRequest,
    ) -> Result<Vec<AclRule>, Error> {
        let path = self.path(region, &format!("instances/{instance_id}/acls"));
        let response: ListAclRulesResponse =
            self.client.request(Method::PUT, &path, Some(request)).await?;
        Ok(response.rules)
    }

    pub async fn list_databases(
        &self,
        region: &str,
        instance_id: &str,
        name: Option<&str>,
    ) -> Result<Vec<Database>, Error> {
        let mut suffix = format!("instances/{instance_id}/databases?page_size=100");
        if let Some(name) = name {
            suffix.push_str(&format!("&name={name}"));
        }
        let path = self.path(region, &suffix);
        let response: ListDatabasesResponse =
            self.client.request::<(), _>(Method::GET, &path, None).await?;
        Ok(response.databases)
    }

    pub async fn create_database(
        &self,
        region: &str,
        instance_id: &str,
        request: &CreateDatabaseRequest,
    ) -> Result<Database, Error> {
        let path = self.path(region, &format!("instances/{instance_id}/databases"));
        self.client.request(Method::POST, &path, Some(request)).await
    }

    pub async fn delete_database(
        &self,
        region: &str,
        instance_id: &str,
        name: &str,
    ) -> Result<(), Error> {
        let path = self.path(region, &format!("instances/{instance_id}/databases/{name}"));
        self.client.request_empty::<()>(Method::DELETE, &path, None).await
    }

    pub async fn list_users(
        &self,
        region: &str,
        instance_id: &str,
        name: Option<&str>,
    ) -> Result<Vec<User>, Error> {
        let mut suffix = format!("instances/{instance_id}/users?page_size=100");
        if let Some(name) = name {
            suffix.push_str(&format!("&name={name}"));
        }
        let path = self.path(region, &suffix);
        let response: ListUsersResponse =
            self.client.request::<(), _>(Method::GET, &path, None).await?;
        Ok(response.users)
    }

    pub async fn create_user(
        &self,
        region: &str,
        instance_id: &str,
        request: &CreateUserRequest,
    ) -> Result<User, Error> {
        let path = self.path(region, &format!("instances/{instance_id}/users"));
        self.client.request(Method::POST, &path, Some(request)).await
    }

    pub async fn update_user(
        &self,
        region: &str,
        instance_id: &str,
        name: &str,
        request: &UpdateUserRequest,
    ) -> Result<User, Error> {
        let path = self.path(region, &format!("instances/{instance_id}/users/{name}"));
        self.client.request(Method::PATCH, &path, Some(request)).await
    }

    pub async fn delete_user(&self, region: &str, instance_id: &str, name: &str) -> Result<(), Error> {
        let path = self.path(region, &format!("instances/{instance_id}/users/{name}"));
        self.client.request_empty::<()>(Method::DELETE, &path, None).await
    }

    pub async fn list_database_engines(&self, region: &str) -> Result<Vec<Engine>, Error> {
        let path = self.path(region, "database-engines?page_size=100");
        let response: ListEnginesResponse =
            self.client.request::<(), _>(Method::GET, &path, None).await?;
        Ok(response.engines)
    }

    pub async fn list_node_types(&self, region: &str) -> Result<Vec<NodeType>, Error> {
        let path = self.path(region, "node-types?page_size=100");
        let response: ListNodeTypesResponse =
            self.client.request::<(), _>(Method::GET, &path, None).await?;
        Ok(response.node_types)
    }
}
