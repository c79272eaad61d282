//! # User Driver
//!
//! Converges `RDBUser` objects with database users on their instance.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::ResourceExt;

use crate::crd::RDBUser;
use crate::manager::rdb::{instance_owner, resolve_instance_ref};
use crate::manager::{Manager, ManagerError, Owner};
use crate::scaleway::types::{CreateUserRequest, UpdateUserRequest, User};
use crate::scaleway::RdbApi;

/// Key holding the password in a referenced secret
pub const SECRET_PASSWORD_KEY: &str = "password";

/// Driver for `RDBUser` resources
pub struct UserManager {
    client: kube::Client,
    api: RdbApi,
}

impl UserManager {
    pub fn new(client: kube::Client, api: RdbApi) -> Self {
        Self { client, api }
    }

    async fn get_by_name(
        &self,
        region: &str,
        instance_id: &str,
        name: &str,
    ) -> Result<Option<User>, ManagerError> {
        let users = match self.api.list_users(region, instance_id, Some(name)).await {
            Ok(users) => users,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(users.into_iter().find(|user| user.name == name))
    }

    async fn resolve_password(&self, user: &RDBUser) -> Result<String, ManagerError> {
        if let Some(value_from) = &user.spec.password.value_from {
            let secrets: Api<Secret> =
                Api::namespaced(self.client.clone(), &value_from.namespace);
            let secret = secrets.get(&value_from.name).await?;
            let password = secret
                .data
                .as_ref()
                .and_then(|data| data.get(SECRET_PASSWORD_KEY))
                .map(|bytes| String::from_utf8_lossy(&bytes.0).into_owned())
                .unwrap_or_default();
            return Ok(password);
        }

        Ok(user.spec.password.value.clone().unwrap_or_default())
    }
}

#[async_trait]
impl Manager<RDBUser> for UserManager {
    async fn ensure(&self, user: &mut RDBUser) -> Result<bool, ManagerError> {
        let namespace = user.namespace().unwrap_or_default();
        let (instance_id, region) =
            resolve_instance_ref(&self.client, &user.spec.instance_ref, &namespace).await?;

        let observed = self
            .get_by_name(&region, &instance_id, &user.spec.user_name)
            .await?;

        match observed {
            Some(observed) => {
                if observed.is_admin != user.spec.admin {
                    self.api
                        .update_user(
                            &region,
                            &instance_id,
                            &observed.name,
                            &UpdateUserRequest {
                                is_admin: Some(user.spec.admin),
                                ..Default::default()
                            },
                        )
                        .await?;
                }
                // Password changes are not detectable through the API
            }
            None => {
                let password = self.resolve_password(user).await?;
                self.api
                    .create_user(
                        &region,
                        &instance_id,
                        &CreateUserRequest {
                            name: user.spec.user_name.clone(),
                            password,
                            is_admin: user.spec.admin,
                        },
                    )
                    .await?;
            }
        }

        Ok(false)
    }

    async fn delete(&self, user: &mut RDBUser) -> Result<bool, ManagerError> {
        let namespace = user.namespace().unwrap_or_default();
        let (instance_id, region) =
            resolve_instance_ref(&self.client, &user.spec.instance_ref, &namespace).await?;

        if instance_id.is_empty() {
            return Ok(true);
        }

        match self
            .api
            .delete_user(&region, &instance_id, &user.spec.user_name)
            .await
        {
            Ok(()) => Ok(false),
            Err(err) if err.is_not_found() => Ok(true),
            Err(err) => Err(err.into()),
        }
    }

    async fn get_owners(&self, user: &RDBUser) -> Result<Vec<Owner>, ManagerError> {
        let namespace = user.namespace().unwrap_or_default();
        instance_owner(&self.client, &user.spec.instance_ref, &namespace).await
    }
}
