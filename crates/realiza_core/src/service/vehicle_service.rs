//! Vehicle stock use-case service.
//!
//! # Responsibility
//! - Provide admin-facing entry points over the vehicle repository.
//! - Keep deletion explicit: `retire_vehicle` tombstones, `purge_vehicle`
//!   removes permanently.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::principal::PrincipalId;
use crate::model::record::RecordId;
use crate::model::vehicle::Vehicle;
use crate::repo::record_repo::RecordRepository;
use crate::repo::{RepoError, RepoResult};

/// Request model for registering a vehicle in stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterVehicleRequest {
    /// Any common spelling; normalized before persistence.
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub model_year: Option<u16>,
    pub obs: Option<String>,
    pub created_by: Option<PrincipalId>,
}

/// Use-case service wrapper for vehicle records.
pub struct VehicleService<R: RecordRepository<Vehicle>> {
    repo: R,
}

impl<R: RecordRepository<Vehicle>> VehicleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers an alive, enabled vehicle and returns its ID.
    pub fn register_vehicle(&self, request: &RegisterVehicleRequest) -> RepoResult<RecordId> {
        let mut vehicle = Vehicle::new(
            &request.plate,
            request.brand.trim(),
            request.model.trim(),
            request.created_by,
        );
        vehicle.model_year = request.model_year;
        vehicle.meta.obs = request.obs.clone();
        self.repo.insert(&mut vehicle)
    }

    /// Admin listing; `show_deleted` switches to the unfiltered view.
    pub fn admin_listing(&self, show_deleted: bool) -> RepoResult<Vec<Vehicle>> {
        if show_deleted {
            self.repo.list_all()
        } else {
            self.repo.list_alive()
        }
    }

    /// Alive and enabled vehicles, as offered to customers.
    pub fn published_vehicles(&self) -> RepoResult<Vec<Vehicle>> {
        Ok(self
            .repo
            .list_alive()?
            .into_iter()
            .filter(|vehicle| vehicle.meta.enabled)
            .collect())
    }

    pub fn get_vehicle(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Vehicle>> {
        self.repo.get(id, include_deleted)
    }

    pub fn update_vehicle(&self, vehicle: &mut Vehicle) -> RepoResult<()> {
        self.repo.update(vehicle)
    }

    /// Toggles business visibility without touching deletion state.
    pub fn set_enabled(&self, id: RecordId, enabled: bool) -> RepoResult<()> {
        let mut vehicle = self
            .repo
            .get(id, false)?
            .ok_or_else(|| RepoError::not_found("vehicles", id))?;
        vehicle.meta.enabled = enabled;
        self.repo.update(&mut vehicle)
    }

    /// Soft-deletes a vehicle. Repeated calls succeed.
    pub fn retire_vehicle(&self, id: RecordId) -> RepoResult<()> {
        self.repo.soft_delete(id)
    }

    /// Permanently removes a vehicle, tombstoned or not.
    pub fn purge_vehicle(&self, id: RecordId) -> RepoResult<()> {
        self.repo.hard_delete(id)
    }
}
