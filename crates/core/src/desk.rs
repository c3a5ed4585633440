//! Entry point that pairs every request type with its pipeline and handler.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::{
    change_password_pipeline, login_pipeline, AuthService, AuthToken, ChangePasswordRequest,
    LoginRequest,
};
use crate::clock::Clock;
use crate::entities::ServiceEntry;
use crate::pipeline::{Dispatch, ValidationPipeline};
use crate::ports::{Page, PasswordHashing, StoreFactory, TokenIssuer};
use crate::service_entries::{
    create_pipeline, list_pipeline, update_pipeline, CreateServiceEntry, DeleteServiceEntry,
    GetServiceEntry, ListServiceEntries, ServiceEntryService, UpdateServiceEntry,
};

/// Collaborators the desk is built from.
pub struct DeskDeps {
    pub stores: Arc<dyn StoreFactory>,
    pub passwords: Arc<dyn PasswordHashing>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub clock: Arc<dyn Clock>,
}

/// Every public operation of the service log.
pub struct ServiceDesk {
    entries: ServiceEntryService,
    auth: AuthService,
    create: ValidationPipeline<CreateServiceEntry>,
    update: ValidationPipeline<UpdateServiceEntry>,
    get: ValidationPipeline<GetServiceEntry>,
    list: ValidationPipeline<ListServiceEntries>,
    delete: ValidationPipeline<DeleteServiceEntry>,
    login: ValidationPipeline<LoginRequest>,
    change_password: ValidationPipeline<ChangePasswordRequest>,
}

impl ServiceDesk {
    pub fn new(deps: DeskDeps) -> Self {
        let DeskDeps {
            stores,
            passwords,
            tokens,
            clock,
        } = deps;
        let users = stores.users();

        Self {
            entries: ServiceEntryService::new(stores, clock.clone()),
            auth: AuthService::new(users, passwords, tokens, clock.clone()),
            create: create_pipeline(clock.clone()),
            update: update_pipeline(clock.clone()),
            get: ValidationPipeline::new(clock.clone()),
            list: list_pipeline(clock.clone()),
            delete: ValidationPipeline::new(clock.clone()),
            login: login_pipeline(clock.clone()),
            change_password: change_password_pipeline(clock),
        }
    }

    pub async fn create_entry(
        &self,
        request: CreateServiceEntry,
        cancel: &CancellationToken,
    ) -> Dispatch<ServiceEntry> {
        self.create.send(request, &self.entries, cancel).await
    }

    pub async fn update_entry(
        &self,
        request: UpdateServiceEntry,
        cancel: &CancellationToken,
    ) -> Dispatch<ServiceEntry> {
        self.update.send(request, &self.entries, cancel).await
    }

    pub async fn get_entry(
        &self,
        request: GetServiceEntry,
        cancel: &CancellationToken,
    ) -> Dispatch<ServiceEntry> {
        self.get.send(request, &self.entries, cancel).await
    }

    pub async fn list_entries(
        &self,
        request: ListServiceEntries,
        cancel: &CancellationToken,
    ) -> Dispatch<Page<ServiceEntry>> {
        self.list.send(request, &self.entries, cancel).await
    }

    pub async fn delete_entry(
        &self,
        request: DeleteServiceEntry,
        cancel: &CancellationToken,
    ) -> Dispatch<()> {
        self.delete.send(request, &self.entries, cancel).await
    }

    pub async fn login(&self, request: LoginRequest, cancel: &CancellationToken) -> Dispatch<AuthToken> {
        self.login.send(request, &self.auth, cancel).await
    }

    pub async fn change_password(
        &self,
        request: ChangePasswordRequest,
        cancel: &CancellationToken,
    ) -> Dispatch<()> {
        self.change_password.send(request, &self.auth, cancel).await
    }
}
