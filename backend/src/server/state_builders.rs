//! Wiring of repositories into services and HTTP state.
//!
//! Services are generic over their repositories, so the same wiring runs
//! against PostgreSQL or the in-memory store.

use std::sync::Arc;

use mockable::Clock;

use medroutines::domain::ports::{
    FixtureLoginService, MedicineRepository, NotificationDelivery, RoutineRepository,
    UserRepository,
};
use medroutines::domain::{
    MedicineService, ReminderSweep, ReminderSweepConfig, ReminderSweepPorts, RoutineService,
    TakenService, UpcomingDosesService, UserProfileService,
};
use medroutines::inbound::http::state::{HttpState, HttpStatePorts};
use medroutines::outbound::memory::InMemoryStore;
use medroutines::outbound::persistence::{
    DbPool, DieselMedicineRepository, DieselRoutineRepository, DieselUserRepository,
};

/// Where application state is kept.
pub enum Storage {
    Postgres(DbPool),
    Memory(Arc<InMemoryStore>),
}

impl Storage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

/// Everything the binary drives: request handlers and the reminder sweep.
pub struct AppServices {
    pub http_state: HttpState,
    pub sweep: Arc<ReminderSweep>,
}

/// Shared inputs besides the repositories.
pub struct ServiceInputs {
    pub clock: Arc<dyn Clock>,
    pub delivery: Arc<dyn NotificationDelivery>,
    pub sweep_config: ReminderSweepConfig,
}

/// Build services over `storage`.
pub fn build_app_services(storage: &Storage, inputs: ServiceInputs) -> AppServices {
    match storage {
        Storage::Postgres(pool) => build_with_repositories(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselMedicineRepository::new(pool.clone())),
            Arc::new(DieselRoutineRepository::new(pool.clone())),
            inputs,
        ),
        Storage::Memory(store) => {
            build_with_repositories(store.clone(), store.clone(), store.clone(), inputs)
        }
    }
}

fn build_with_repositories<U, M, R>(
    users: Arc<U>,
    medicines: Arc<M>,
    routines: Arc<R>,
    inputs: ServiceInputs,
) -> AppServices
where
    U: UserRepository + 'static,
    M: MedicineRepository + 'static,
    R: RoutineRepository + 'static,
{
    let ServiceInputs {
        clock,
        delivery,
        sweep_config,
    } = inputs;

    let routine_service = Arc::new(RoutineService::new(
        users.clone(),
        medicines.clone(),
        routines.clone(),
        clock.clone(),
    ));
    let http_state = HttpState::new(HttpStatePorts {
        login: Arc::new(FixtureLoginService),
        profile: Arc::new(UserProfileService::new(users.clone())),
        routines: routine_service.clone(),
        routines_query: routine_service,
        taken: Arc::new(TakenService::new(routines.clone(), clock.clone())),
        upcoming: Arc::new(UpcomingDosesService::new(
            users.clone(),
            routines.clone(),
            clock.clone(),
        )),
        medicines: Arc::new(MedicineService::new(medicines)),
    });
    let sweep = Arc::new(ReminderSweep::new(
        ReminderSweepPorts {
            users,
            routines,
            delivery,
        },
        clock,
        sweep_config,
    ));
    AppServices { http_state, sweep }
}
