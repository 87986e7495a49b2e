//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and depend only on driving
//! ports, so they can be exercised without storage.

use std::sync::Arc;

use crate::domain::ports::{
    LoginService, MedicineCatalogue, RoutineCommand, RoutineQuery, TakenCommand,
    UpcomingDosesQuery, UserProfile,
};

/// Parameter object bundling the port implementations handlers call.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub profile: Arc<dyn UserProfile>,
    pub routines: Arc<dyn RoutineCommand>,
    pub routines_query: Arc<dyn RoutineQuery>,
    pub taken: Arc<dyn TakenCommand>,
    pub upcoming: Arc<dyn UpcomingDosesQuery>,
    pub medicines: Arc<dyn MedicineCatalogue>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub profile: Arc<dyn UserProfile>,
    pub routines: Arc<dyn RoutineCommand>,
    pub routines_query: Arc<dyn RoutineQuery>,
    pub taken: Arc<dyn TakenCommand>,
    pub upcoming: Arc<dyn UpcomingDosesQuery>,
    pub medicines: Arc<dyn MedicineCatalogue>,
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use medroutines::domain::ports::FixtureLoginService;
    /// use medroutines::domain::{
    ///     MedicineService, RoutineService, TakenService, UpcomingDosesService,
    ///     UserProfileService,
    /// };
    /// use medroutines::inbound::http::state::{HttpState, HttpStatePorts};
    /// use medroutines::outbound::memory::InMemoryStore;
    ///
    /// let store = Arc::new(InMemoryStore::new());
    /// let clock = Arc::new(DefaultClock);
    /// let routines = Arc::new(RoutineService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     store.clone(),
    ///     clock.clone(),
    /// ));
    /// let state = HttpState::new(HttpStatePorts {
    ///     login: Arc::new(FixtureLoginService),
    ///     profile: Arc::new(UserProfileService::new(store.clone())),
    ///     routines: routines.clone(),
    ///     routines_query: routines,
    ///     taken: Arc::new(TakenService::new(store.clone(), clock.clone())),
    ///     upcoming: Arc::new(UpcomingDosesService::new(store.clone(), store.clone(), clock)),
    ///     medicines: Arc::new(MedicineService::new(store)),
    /// });
    /// let _login = state.login.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            profile,
            routines,
            routines_query,
            taken,
            upcoming,
            medicines,
        } = ports;
        Self {
            login,
            profile,
            routines,
            routines_query,
            taken,
            upcoming,
            medicines,
        }
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
