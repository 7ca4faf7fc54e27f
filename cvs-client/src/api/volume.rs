use cvs_core::{CreateVolumeResult, OperationStatus, Prepared, Request, Verb, VolumeRequest, VolumeResult};
use serde::de::{DeserializeOwned, Error as _};

use super::VolumeApi;
use crate::{client::retry::RetryPolicy, Error, Result};

impl VolumeApi {
    /// Get a volume by id
    ///
    /// ```no_run
    /// # async fn wrapper(volumes: cvs_client::VolumeApi) -> Result<(), Box<dyn std::error::Error>> {
    /// let v = volumes.get("us-west2", "f81d4fae-7dec-11d0-a765-00a0c91e6bf6").await?;
    /// println!("{} is {}", v.name, v.lifecycle_state);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the control plane does not know the id,
    /// whether it says so with a 404 status or a 404 envelope code.
    pub async fn get(&self, region: &str, volume_id: &str) -> Result<VolumeResult> {
        require("region", region)?;
        require("volume id", volume_id)?;
        let prepared = Request::new(format!("{region}/Volumes/{volume_id}")).fetch();
        let outcome = self.client.call(&prepared, "getVolumeByID").await?;
        if outcome.is_not_found() {
            return Err(Error::NotFound(volume_id.to_owned()));
        }
        decode(&outcome.into_body().map_err(Error::Api)?)
    }

    /// List all volumes in a region, in the order the control plane returns them
    pub async fn list(&self, region: &str) -> Result<Vec<VolumeResult>> {
        require("region", region)?;
        let prepared = Request::new(format!("{region}/Volumes")).fetch();
        decode(&self.fetch_once(&prepared, "getVolumeByRegion").await?)
    }

    /// Find a volume in `lookup.region` by name, creation token, or both.
    ///
    /// See [`select_volume`] for how matches are resolved.
    pub async fn find(&self, lookup: &VolumeRequest) -> Result<VolumeResult> {
        if lookup.name.is_empty() && lookup.creation_token.is_empty() {
            return Err(Error::InvalidRequest(
                "either a creation token or a volume name is required".into(),
            ));
        }
        require("region", &lookup.region)?;
        let prepared = Request::new(format!("{}/Volumes", lookup.region)).fetch();
        let volumes = decode(
            &self
                .fetch_once(&prepared, "getVolumeByNameOrCreationToken")
                .await?,
        )?;
        select_volume(volumes, &lookup.name, &lookup.creation_token)
    }

    /// Create a volume
    ///
    /// A creation token is fetched from the control plane first unless `request` carries one.
    /// The network is qualified as `projects/{project}/global/networks/{network}`, in the shared
    /// VPC host project when one is named and in the client's project otherwise.
    ///
    /// The request is serialized once and resubmitted unchanged while the control plane
    /// reports it is busy, so every attempt carries the same creation token.
    pub async fn create(&self, mut request: VolumeRequest) -> Result<CreateVolumeResult> {
        require("region", &request.region)?;
        if request.creation_token.is_empty() {
            request.creation_token = self.creation_token(&request.region).await?;
        }
        let project = request
            .shared_vpc_project_number
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(self.client.project());
        request.network = format!("projects/{project}/global/networks/{}", request.network);

        let prepared = Request::new(format!("{}/Volumes", request.region))
            .prepare(Verb::Create, Some(&request))
            .map_err(Error::BuildRequest)?;
        tracing::info!(
            name = %request.name,
            region = %request.region,
            creation_token = %request.creation_token,
            "creating volume"
        );
        let body = RetryPolicy::create()
            .run("createVolume", &mut self.rng(), &self.cancel, || {
                self.client.call(&prepared, "createVolume")
            })
            .await?;
        let mut created: CreateVolumeResult = decode(&body)?;
        created.creation_token = request.creation_token;
        Ok(created)
    }

    /// Update a volume in place, identified by `request.region` and `request.volume_id`.
    ///
    /// Submitted once. The control plane can report a rejected update inside a successful
    /// response, which surfaces as [`Error::UpdateRejected`]. Only code 0 with an empty
    /// message is accepted; a `{"code": 200}` envelope is rejected like any other code.
    pub async fn update(&self, request: &VolumeRequest) -> Result<()> {
        require("region", &request.region)?;
        require("volume id", &request.volume_id)?;
        let prepared = Request::new(format!("{}/Volumes/{}", request.region, request.volume_id))
            .prepare(Verb::Replace, Some(request))
            .map_err(Error::BuildRequest)?;
        let body = self.fetch_once(&prepared, "updateVolume").await?;
        if body.trim().is_empty() {
            return Ok(());
        }
        let status: OperationStatus = decode(&body)?;
        if status.is_success() {
            Ok(())
        } else {
            tracing::debug!(code = status.code, message = %status.message, "update rejected");
            Err(Error::UpdateRejected {
                code: status.code,
                message: status.message,
            })
        }
    }

    /// Delete a volume by id, retrying while the control plane is busy
    pub async fn delete(&self, region: &str, volume_id: &str) -> Result<()> {
        require("region", region)?;
        require("volume id", volume_id)?;
        let prepared = Request::new(format!("{region}/Volumes/{volume_id}")).remove();
        tracing::info!(%region, %volume_id, "deleting volume");
        RetryPolicy::delete()
            .run("deleteVolume", &mut self.rng(), &self.cancel, || {
                self.client.call(&prepared, "deleteVolume")
            })
            .await?;
        Ok(())
    }

    async fn creation_token(&self, region: &str) -> Result<String> {
        let prepared = Request::new(format!("{region}/VolumeCreationToken")).fetch();
        let minted: VolumeResult = decode(
            &self
                .fetch_once(&prepared, "createVolumeCreationToken")
                .await?,
        )?;
        if minted.creation_token.is_empty() {
            return Err(Error::SerdeError(serde_json::Error::missing_field("creationToken")));
        }
        tracing::debug!(creation_token = %minted.creation_token, "minted creation token");
        Ok(minted.creation_token)
    }

    // Reads and updates are never retried; a busy or code 0 answer fails like any other.
    async fn fetch_once(&self, prepared: &Prepared, operation: &str) -> Result<String> {
        self.client
            .call(prepared, operation)
            .await?
            .into_body()
            .map_err(Error::Api)
    }
}

/// Pick the volume a name and creation token lookup refers to.
///
/// Empty strings mean "not given".
///
/// - With a creation token, the first volume holding it wins. A given name must match it,
///   otherwise the lookup is a [`Error::Conflict`]. No holder is [`Error::NotFound`].
/// - With a name only, exactly one volume may carry it. Several is [`Error::AmbiguousMatch`],
///   none is [`Error::NotFound`].
pub fn select_volume(
    volumes: Vec<VolumeResult>,
    name: &str,
    creation_token: &str,
) -> Result<VolumeResult> {
    if !creation_token.is_empty() {
        let volume = volumes
            .into_iter()
            .find(|v| v.creation_token == creation_token)
            .ok_or_else(|| Error::NotFound(creation_token.to_owned()))?;
        if !name.is_empty() && volume.name != name {
            return Err(Error::Conflict {
                creation_token: creation_token.to_owned(),
                name: name.to_owned(),
                found: volume.name,
            });
        }
        return Ok(volume);
    }
    if name.is_empty() {
        return Err(Error::InvalidRequest(
            "either a creation token or a volume name is required".into(),
        ));
    }
    let mut named: Vec<VolumeResult> = volumes.into_iter().filter(|v| v.name == name).collect();
    match named.len() {
        0 => Err(Error::NotFound(name.to_owned())),
        1 => Ok(named.remove(0)),
        count => Err(Error::AmbiguousMatch {
            name: name.to_owned(),
            count,
        }),
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidRequest(format!("{what} is required")));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(Error::SerdeError)
}
