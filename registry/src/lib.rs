use std::sync::Arc;

use adapter::database::ConnectionPool;
use adapter::repository::facility::FacilityRepositoryImpl;
use adapter::repository::health::HealthCheckRepositoryImpl;
use adapter::repository::reservation::ReservationRepositoryImpl;
use adapter::repository::schedule::ScheduleRuleRepositoryImpl;
use adapter::repository::venue::VenueRepositoryImpl;
use kernel::repository::facility::FacilityRepository;
use kernel::repository::health::HealthCheckRepository;
use kernel::repository::reservation::ReservationRepository;
use kernel::repository::schedule::ScheduleRuleRepository;
use kernel::repository::venue::VenueRepository;

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    facility_repository: Arc<dyn FacilityRepository>,
    venue_repository: Arc<dyn VenueRepository>,
    schedule_rule_repository: Arc<dyn ScheduleRuleRepository>,
    reservation_repository: Arc<dyn ReservationRepository>,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(pool.clone()));
        let facility_repository = Arc::new(FacilityRepositoryImpl::new(pool.clone()));
        let venue_repository = Arc::new(VenueRepositoryImpl::new(pool.clone()));
        let schedule_rule_repository = Arc::new(ScheduleRuleRepositoryImpl::new(pool.clone()));
        let reservation_repository = Arc::new(ReservationRepositoryImpl::new(pool.clone()));
        Self {
            health_check_repository,
            facility_repository,
            venue_repository,
            schedule_rule_repository,
            reservation_repository,
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn facility_repository(&self) -> Arc<dyn FacilityRepository> {
        self.facility_repository.clone()
    }

    pub fn venue_repository(&self) -> Arc<dyn VenueRepository> {
        self.venue_repository.clone()
    }

    pub fn schedule_rule_repository(&self) -> Arc<dyn ScheduleRuleRepository> {
        self.schedule_rule_repository.clone()
    }

    pub fn reservation_repository(&self) -> Arc<dyn ReservationRepository> {
        self.reservation_repository.clone()
    }
}
