//! # Node Creation and Combined Writes
//!
//! Exercises the facade's draft-batch ("combo") surface over the full
//! provider-backed stack: node anchoring drafts, combined submission of
//! several logical writes, and payload wire checks.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use metaid_sdk::{
        mock_address, Chain, Connector, CreateOptions, CreateResult, Entity, MetaidConfig,
        MetaidError, MockIndexer, MockProvider, NodeParent, ProviderWallet, Schema, SerialAction,
        Utxo, NULL_BODY,
    };

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

    fn data_script_of(draft: &metaid_sdk::DraftTransaction) -> Vec<u8> {
        draft
            .composer
            .outputs()
            .iter()
            .find_map(|output| match output {
                metaid_sdk::domain::TxOutput::Data { script } => Some(script.clone()),
                _ => None,
            })
            .expect("draft must carry a data output")
    }

    #[tokio::test]
    async fn test_node_drafts_embed_null_body_placeholder() {
        let (entity, _provider, _indexer) = full_stack().await;

        let parent = NodeParent {
            address: None,
            public_key: "02aabb".to_string(),
            txid: "ee".repeat(32),
            body: None,
        };
        let drafts = entity
            .create_metaid_root(&parent, "SimpleMicroblog")
            .await
            .unwrap();

        let script = data_script_of(&drafts[0]);
        let needle = NULL_BODY.as_bytes();
        assert!(
            script.windows(needle.len()).any(|w| w == needle),
            "node record without a body must embed the NULL placeholder"
        );
    }

    #[tokio::test]
    async fn test_node_drafts_link_parent_dust() {
        let (entity, _provider, indexer) = full_stack().await;

        let parent_address = mock_address(0x61);
        indexer.insert_utxos(
            &parent_address,
            vec![Utxo {
                txid: "dd".repeat(32),
                out_index: 0,
                value: 546,
            }],
        );

        let parent = NodeParent {
            address: Some(parent_address.clone()),
            public_key: "02aabb".to_string(),
            txid: "ee".repeat(32),
            body: Some("profile".to_string()),
        };
        let drafts = entity
            .create_metaid_root(&parent, "Profile")
            .await
            .unwrap();

        assert_eq!(drafts.len(), 1);
        let input = drafts[0].composer.input(0).unwrap();
        assert_eq!(input.address, parent_address);
        assert_eq!(input.txid, "dd".repeat(32));
    }

    #[tokio::test]
    async fn test_combined_write_submits_single_batch() {
        let (entity, provider, indexer) = full_stack().await;

        // anchor a node, then publish content, in one on-chain submission
        let parent = NodeParent {
            address: None,
            public_key: "02aabb".to_string(),
            txid: "ee".repeat(32),
            body: None,
        };
        let carried = entity
            .create_metaid_root(&parent, "SimpleMicroblog")
            .await
            .unwrap();

        let result = entity
            .create(
                Some("{\"content\":\"first post\"}"),
                CreateOptions {
                    path: "/protocols/simplebuzz".to_string(),
                    serial_action: SerialAction::Finish,
                    drafts: carried,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(matches!(result, CreateResult::Submitted { .. }));
        assert_eq!(provider.pay_request_count(), 1);
        assert_eq!(indexer.broadcast_count(), 2);
        assert_eq!(indexer.notified_hexes().len(), 1);
    }

    #[tokio::test]
    async fn test_combo_without_finish_touches_nothing() {
        let (entity, provider, indexer) = full_stack().await;

        let result = entity
            .create(
                Some("draft only"),
                CreateOptions {
                    path: "/protocols/simplebuzz".to_string(),
                    data_type: "text/plain".to_string(),
                    serial_action: SerialAction::Combo,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        match result {
            CreateResult::Drafts(drafts) => assert_eq!(drafts.len(), 1),
            CreateResult::Submitted { .. } => panic!("combo must stay unsubmitted"),
        }
        assert_eq!(provider.pay_request_count(), 0);
        assert_eq!(indexer.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_path_rejected_as_validation() {
        let (entity, _provider, _indexer) = full_stack().await;

        let result = entity
            .create(Some("hi"), CreateOptions::default())
            .await;
        assert!(matches!(result, Err(MetaidError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_non_buzz_schema_rejects_feed_reads() {
        let provider = Arc::new(MockProvider::default());
        let indexer = Arc::new(MockIndexer::new());
        let wallet = ProviderWallet::create(
            Some(provider),
            indexer.clone(),
            Chain::Mvc,
            MetaidConfig::for_testing(),
        )
        .await
        .unwrap();
        let connector = Connector::connect(Arc::new(wallet), indexer).await.unwrap();
        let schema = Schema::new(
            "file",
            "MetaFile",
            vec![metaid_sdk::SchemaVersion {
                id: "f1".to_string(),
                version: "1.0.0".to_string(),
            }],
        )
        .unwrap();
        let entity = Entity::with_config(connector, schema, MetaidConfig::for_testing());

        assert!(matches!(
            entity.list(0).await,
            Err(MetaidError::NotSupported)
        ));
    }
}
