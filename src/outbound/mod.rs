pub mod geocoder;
pub mod mailer;
pub mod photo_store;

pub use geocoder::{geocoder_from_config, GeoPoint, GeocodeError, Geocoder, MapQuestGeocoder, UnconfiguredGeocoder};
pub use mailer::{Email, LogMailer, MailError, Mailer};
pub use photo_store::{LocalPhotoStore, PhotoStore, PhotoStoreError};
