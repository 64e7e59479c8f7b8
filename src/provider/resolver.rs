//! Lazily populated, process-lifetime cache of the provider configuration.

// self
use crate::{
	_prelude::*,
	provider::{DiscoveryDocument, Installation, InstallationSource, ProviderConfiguration},
};

/// Loads the installation descriptor and discovery document once, then serves the cached
/// [`ProviderConfiguration`] until [`ConfigurationResolver::invalidate`] is called.
///
/// Reads take a `parking_lot` read lock; first-time resolution is serialized behind an async
/// guard so concurrent callers share one discovery fetch.
#[derive(Debug, Default)]
pub struct ConfigurationResolver {
	source: InstallationSource,
	cached: RwLock<Option<Arc<ProviderConfiguration>>>,
	init_guard: AsyncMutex<()>,
}
impl ConfigurationResolver {
	/// Creates a resolver for the given descriptor source.
	pub fn new(source: impl Into<InstallationSource>) -> Self {
		Self { source: source.into(), cached: Default::default(), init_guard: Default::default() }
	}

	/// Descriptor source the resolver reads from.
	pub fn source(&self) -> &InstallationSource {
		&self.source
	}

	/// Returns the cached configuration without resolving it.
	pub fn cached(&self) -> Option<Arc<ProviderConfiguration>> {
		self.cached.read().clone()
	}

	/// Drops the cached configuration so the next [`resolve`](Self::resolve) fetches again.
	pub fn invalidate(&self) {
		*self.cached.write() = None;
	}

	/// Returns the configuration, loading the descriptor and calling `discover` on first use.
	///
	/// `discover` receives the descriptor and the well-known URL and returns the parsed
	/// discovery document. It is never called once a configuration is cached.
	pub async fn resolve<F, Fut>(&self, discover: F) -> Result<Arc<ProviderConfiguration>>
	where
		F: FnOnce(Installation, Url) -> Fut,
		Fut: Future<Output = Result<DiscoveryDocument>>,
	{
		if let Some(config) = self.cached() {
			return Ok(config);
		}

		let _guard = self.init_guard.lock().await;

		if let Some(config) = self.cached() {
			return Ok(config);
		}

		let installation = self.source.load()?;
		let well_known = installation.well_known_url()?;
		let document = discover(installation.clone(), well_known.clone()).await?;
		let config = Arc::new(ProviderConfiguration::new(&installation, well_known, document));

		*self.cached.write() = Some(config.clone());

		Ok(config)
	}
}
