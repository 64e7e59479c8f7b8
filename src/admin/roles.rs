//! Client-level role mappings and role reconciliation.

// std
use std::collections::BTreeSet;
// self
use crate::{
	_prelude::*,
	admin::{AdminClient, try_outcome},
	dispatch::{AdminReply, Method},
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	policy::Outcome,
};

/// Changes applied by [`AdminClient::update_effective_user_roles`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleReconciliation {
	/// Role names mapped to the user.
	pub added: Vec<String>,
	/// Role names unmapped from the user.
	pub removed: Vec<String>,
}
impl RoleReconciliation {
	/// Returns `true` when the user already had exactly the requested roles.
	pub fn is_unchanged(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty()
	}
}

impl<C, M> AdminClient<'_, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Maps client roles (JSON role representations) to a user.
	pub async fn add_client_roles_to_user(
		&self,
		user_id: &str,
		client_uuid: &str,
		roles: &JsonValue,
	) -> Result<Outcome<AdminReply>> {
		self.send(Method::Post, client_mapping_path(user_id, client_uuid), |request| {
			request.body(roles.clone())
		})
		.await
	}

	/// Unmaps client roles (JSON role representations) from a user.
	pub async fn remove_client_roles_from_user(
		&self,
		user_id: &str,
		client_uuid: &str,
		roles: &JsonValue,
	) -> Result<Outcome<AdminReply>> {
		self.send(Method::Delete, client_mapping_path(user_id, client_uuid), |request| {
			request.body(roles.clone())
		})
		.await
	}

	/// Client roles currently mapped to a user.
	pub async fn client_roles_for_user(
		&self,
		user_id: &str,
		client_uuid: &str,
	) -> Result<Outcome<AdminReply>> {
		self.send(Method::Get, client_mapping_path(user_id, client_uuid), |request| request).await
	}

	/// Internal id of the client whose `clientId` is `client_id`.
	pub async fn client_uuid(&self, client_id: &str) -> Result<Outcome<String>> {
		let clients: Vec<JsonValue> = try_outcome!(self.clients(Some(client_id)).await?).json()?;
		let id = clients
			.iter()
			.find_map(|client| client.get("id").and_then(JsonValue::as_str))
			.ok_or_else(|| Error::ClientNotFound { client_id: client_id.to_owned() })?;

		Ok(Outcome::Success(id.to_owned()))
	}

	/// Makes the user's roles for `client_id` exactly `role_names`.
	///
	/// Empty names are ignored. Roles missing from the user are looked up and mapped; mapped
	/// roles not requested are unmapped. No mapping call is made for a side with nothing to
	/// change, so repeating a reconciliation is a no-op.
	pub async fn update_effective_user_roles(
		&self,
		user_id: &str,
		client_id: &str,
		role_names: &[&str],
	) -> Result<Outcome<RoleReconciliation>> {
		let client_uuid = try_outcome!(self.client_uuid(client_id).await?);
		let mapped: Vec<JsonValue> =
			try_outcome!(self.client_roles_for_user(user_id, &client_uuid).await?).json()?;
		let desired =
			role_names.iter().filter(|name| !name.is_empty()).copied().collect::<BTreeSet<_>>();
		let mapped_names = mapped.iter().filter_map(role_name).collect::<BTreeSet<_>>();
		let mut reconciliation = RoleReconciliation::default();
		let mut to_add = Vec::new();

		for name in desired.difference(&mapped_names) {
			let role: JsonValue =
				try_outcome!(self.client_role(&client_uuid, name).await?).json()?;

			to_add.push(role);
			reconciliation.added.push((*name).to_owned());
		}

		let to_remove = mapped
			.iter()
			.filter(|role| role_name(role).is_some_and(|name| !desired.contains(name)))
			.cloned()
			.collect::<Vec<_>>();

		reconciliation.removed =
			to_remove.iter().filter_map(role_name).map(ToOwned::to_owned).collect();

		if !to_remove.is_empty() {
			try_outcome!(
				self.remove_client_roles_from_user(user_id, &client_uuid, &to_remove.into()).await?
			);
		}
		if !to_add.is_empty() {
			try_outcome!(
				self.add_client_roles_to_user(user_id, &client_uuid, &to_add.into()).await?
			);
		}

		Ok(Outcome::Success(reconciliation))
	}
}

fn client_mapping_path<'a>(user_id: &'a str, client_uuid: &'a str) -> [&'a str; 5] {
	["users", user_id, "role-mappings", "clients", client_uuid]
}

fn role_name(role: &JsonValue) -> Option<&str> {
	role.get("name").and_then(JsonValue::as_str)
}
