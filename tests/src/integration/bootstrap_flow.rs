//! # Root Bootstrap Integration
//!
//! Drives the full stack: MockProvider → ProviderWallet → Connector →
//! Entity facade → ports, asserting the wire-level choreography of root
//! creation.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use metaid_sdk::{
        Chain, Connector, Entity, MetaidConfig, MetaidError, MockIndexer, MockProvider,
        ProviderWallet, Root, RootCandidate, RootQuery, Schema, User, WalletCapability,
    };

    fn sample_root(node_name: &str) -> Root {
        Root {
            id: "root-1".to_string(),
            node_name: node_name.to_string(),
            address: "addr".to_string(),
            txid: "ff".repeat(32),
            public_key: "02aabb".to_string(),
            parent_txid: "ee".repeat(32),
            parent_public_key: "02ccdd".to_string(),
            version: "1.0.0".to_string(),
            created_at: 1700000000,
        }
    }

    /// Provider-backed entity plus handles to every collaborator.
    async fn full_stack() -> (Entity, Arc<MockProvider>, Arc<MockIndexer>) {
        let provider = Arc::new(MockProvider::default());
        let indexer = Arc::new(MockIndexer::new());
        let wallet = ProviderWallet::create(
            Some(provider.clone()),
            indexer.clone(),
            Chain::Mvc,
            MetaidConfig::for_testing(),
        )
        .await
        .unwrap();

        let connector = Connector::connect(Arc::new(wallet), indexer.clone())
            .await
            .unwrap();
        let entity = Entity::with_config(connector, Schema::buzz(), MetaidConfig::for_testing());
        (entity, provider, indexer)
    }

    fn root_query(entity: &Entity) -> RootQuery {
        RootQuery {
            metaid: entity.metaid().to_string(),
            node_name: entity.schema().node_name.clone(),
            node_id: entity.schema().current_version().id.clone(),
        }
    }

    fn seed_onboarded_user(entity: &Entity, indexer: &MockIndexer, xpub: &str) {
        let protocol_txid = "ee".repeat(32);
        indexer.insert_candidate(
            xpub,
            &protocol_txid,
            RootCandidate {
                public_key: "02aabb".to_string(),
            },
        );
        indexer.insert_user(
            entity.metaid(),
            User {
                metaid: Some(entity.metaid().to_string()),
                protocol_txid,
                name: Some("tester".to_string()),
                address: entity.address().to_string(),
            },
        );
    }

    #[tokio::test]
    async fn test_bootstrap_end_to_end_via_provider() {
        let (entity, provider, indexer) = full_stack().await;
        seed_onboarded_user(&entity, &indexer, "xpub-mock");
        let query = root_query(&entity);
        indexer.insert_pending_root(&query, sample_root(&query.node_name), 0);

        let root = entity.get_root().await.unwrap().unwrap();
        assert_eq!(root.node_name, "SimpleMicroblog");

        // one pay batch reached the provider: funding draft + link draft
        assert_eq!(provider.pay_request_count(), 1);
        // both raw transactions were broadcast, then the link hex notified
        assert_eq!(indexer.broadcast_count(), 2);
        assert_eq!(indexer.notified_hexes().len(), 1);
    }

    #[tokio::test]
    async fn test_existing_root_reaches_no_provider_call() {
        let (entity, provider, indexer) = full_stack().await;
        let query = root_query(&entity);
        indexer.insert_root(&query, sample_root(&query.node_name));

        let root = entity.get_root().await.unwrap();
        assert!(root.is_some());
        assert_eq!(provider.pay_request_count(), 0);
        assert_eq!(indexer.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_not_onboarded_user_resolves_absent_root() {
        let (entity, provider, indexer) = full_stack().await;
        // no user seeded at all
        let root = entity.get_root().await.unwrap();
        assert!(root.is_none());
        assert_eq!(provider.pay_request_count(), 0);
        assert_eq!(indexer.notified_hexes().len(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_survives_indexer_lag() {
        let (entity, _provider, indexer) = full_stack().await;
        seed_onboarded_user(&entity, &indexer, "xpub-mock");
        let query = root_query(&entity);
        // visible only after one missed post-notify poll
        indexer.insert_pending_root(&query, sample_root(&query.node_name), 1);

        let root = entity.get_root().await.unwrap();
        assert!(root.is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_gives_up_when_root_never_appears() {
        let (entity, provider, indexer) = full_stack().await;
        seed_onboarded_user(&entity, &indexer, "xpub-mock");
        // no pending root: polling must exhaust

        let result = entity.get_root().await;
        assert!(matches!(result, Err(MetaidError::RootCreationFailed)));
        // the submission itself still happened exactly once
        assert_eq!(provider.pay_request_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_get_root_submits_once() {
        let (entity, provider, indexer) = full_stack().await;
        seed_onboarded_user(&entity, &indexer, "xpub-mock");
        let query = root_query(&entity);
        indexer.insert_pending_root(&query, sample_root(&query.node_name), 0);

        let entity = Arc::new(entity);
        let a = {
            let entity = entity.clone();
            tokio::spawn(async move { entity.get_root().await })
        };
        let b = {
            let entity = entity.clone();
            tokio::spawn(async move { entity.get_root().await })
        };

        let first = a.await.unwrap().unwrap();
        let second = b.await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            provider.pay_request_count(),
            1,
            "concurrent callers must not duplicate the anchor submission"
        );
    }

    #[tokio::test]
    async fn test_disconnect_gates_the_facade() {
        let (entity, _provider, _indexer) = full_stack().await;
        entity.disconnect();
        assert!(matches!(
            entity.get_root().await,
            Err(MetaidError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_sign_input_depth_exhaustion_condition() {
        // the boundary condition must be CannotDerivePath, not NoOutput
        // or a network error
        let provider = Arc::new(MockProvider::default());
        let indexer = Arc::new(MockIndexer::new());
        let wallet = ProviderWallet::create(
            Some(provider),
            indexer,
            Chain::Mvc,
            MetaidConfig::for_testing(),
        )
        .await
        .unwrap();

        let mut composer = metaid_sdk::TxComposer::new();
        composer.append_input(metaid_sdk::mock_address(0x77), "ab".repeat(32), 0, 546);
        let result = wallet.sign_input(composer, 0).await;
        assert!(matches!(result, Err(MetaidError::CannotDerivePath)));
    }
}
