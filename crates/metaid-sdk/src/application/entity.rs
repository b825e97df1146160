//! # Entity Facade
//!
//! Per-schema surface of the SDK: connection-gated reads and writes for
//! one entity (e.g. buzz). Write operations route through the bootstrap
//! engine and the payload builder; reads go straight to the indexer.

use std::sync::Arc;

use crate::application::bootstrap::{source_dust, RootBootstrap};
use crate::application::connector::Connector;
use crate::config::MetaidConfig;
use crate::domain::{
    build_generic_payload, build_user_payload, Buzz, BuzzPage, DraftTransaction, Encryption,
    MetaidError, Operation, Result, Root, Schema, SerialAction, TxComposer, BUZZ_PAGE_LIMIT,
};

/// Parent node a new protocol node links under.
#[derive(Clone, Debug, Default)]
pub struct NodeParent {
    /// Parent node address. When present, the new node spends a dust
    /// output at it.
    pub address: Option<String>,
    /// Parent node public key, embedded in the record.
    pub public_key: String,
    /// Parent transaction id.
    pub txid: String,
    /// Optional node body.
    pub body: Option<String>,
}

/// Options of a content write.
#[derive(Clone, Debug)]
pub struct CreateOptions {
    /// Operation kind.
    pub operation: Operation,
    /// Protocol tree path of the entry.
    pub path: String,
    /// Body encryption marker.
    pub encryption: Encryption,
    /// MIME type of the body.
    pub data_type: String,
    /// Body text encoding.
    pub encoding: String,
    /// Submit now, or accumulate into a combined batch.
    pub serial_action: SerialAction,
    /// Drafts carried over from earlier combo writes.
    pub drafts: Vec<DraftTransaction>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            operation: Operation::Create,
            path: String::new(),
            encryption: Encryption::Plain,
            data_type: "application/json".to_string(),
            encoding: "utf-8".to_string(),
            serial_action: SerialAction::Finish,
            drafts: Vec::new(),
        }
    }
}

/// Outcome of a facade write.
#[derive(Clone, Debug)]
pub enum CreateResult {
    /// Combo mode: the accumulated, unsubmitted draft batch.
    Drafts(Vec<DraftTransaction>),
    /// The batch was paid, broadcast, and the indexer notified.
    Submitted {
        /// Txid of the final (data-carrying) transaction.
        txid: String,
    },
}

/// Per-schema facade over a connected session.
pub struct Entity {
    connector: Arc<Connector>,
    schema: Schema,
    config: MetaidConfig,
    bootstrap: RootBootstrap,
}

impl Entity {
    /// Facade for `schema` over an established session.
    pub fn new(connector: Arc<Connector>, schema: Schema) -> Self {
        Self::with_config(connector, schema, MetaidConfig::default())
    }

    /// Facade with explicit configuration.
    pub fn with_config(connector: Arc<Connector>, schema: Schema, config: MetaidConfig) -> Self {
        let bootstrap = RootBootstrap::new(connector.clone(), config.clone());
        Self {
            connector,
            schema,
            config,
            bootstrap,
        }
    }

    /// Entity name, e.g. `"buzz"`.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// The schema this facade serves.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Session address.
    pub fn address(&self) -> &str {
        self.connector.address()
    }

    /// Session metaid.
    pub fn metaid(&self) -> &str {
        self.connector.metaid()
    }

    /// Whether the session is still active.
    pub fn is_connected(&self) -> bool {
        self.connector.is_connected()
    }

    /// Tear down the session.
    pub fn disconnect(&self) {
        self.connector.disconnect()
    }

    /// One page of the session user's feed. Public read, buzz only.
    pub async fn list(&self, page: u32) -> Result<BuzzPage> {
        if self.name() != "buzz" {
            return Err(MetaidError::NotSupported);
        }
        let items = self
            .connector
            .indexer()
            .fetch_buzzes(self.connector.metaid(), page)
            .await?;
        Ok(BuzzPage {
            items,
            limit: BUZZ_PAGE_LIMIT,
        })
    }

    /// A single feed item by txid. Public read, buzz only.
    pub async fn one(&self, txid: &str) -> Result<Option<Buzz>> {
        if self.name() != "buzz" {
            return Err(MetaidError::NotSupported);
        }
        self.connector.indexer().fetch_one_buzz(txid).await
    }

    /// The session user's root for this schema, creating it on first
    /// need. Memoized for the session lifetime.
    pub async fn get_root(&self) -> Result<Option<Root>> {
        self.connector.guard()?;
        self.bootstrap.ensure_root(&self.schema).await
    }

    /// Build the draft batch anchoring a protocol node named `node_name`
    /// under `parent`. Returns the batch unsubmitted so the caller can
    /// combine it with further writes.
    pub async fn create_metaid_root(
        &self,
        parent: &NodeParent,
        node_name: &str,
    ) -> Result<Vec<DraftTransaction>> {
        self.connector.guard()?;
        if !self.connector.chain().supports_writes() {
            return Err(MetaidError::NotSupported);
        }

        let mut drafts: Vec<DraftTransaction> = Vec::new();
        let mut dust: Option<(String, u64)> = None;
        if let Some(parent_address) = parent.address.as_deref() {
            dust = Some(
                source_dust(&self.connector, self.config.dust_limit, parent_address, &mut drafts)
                    .await?,
            );
        }

        let mut link = TxComposer::new();
        if let (Some((dust_txid, dust_value)), Some(parent_address)) =
            (&dust, parent.address.as_deref())
        {
            link.append_input(parent_address, dust_txid.clone(), 0, *dust_value);
        }
        let payload = build_user_payload(
            &parent.public_key,
            &parent.txid,
            node_name,
            parent.body.as_deref(),
        )?;
        link.append_data_output(payload)?;
        drafts.push(DraftTransaction::new(
            link,
            format!("Create Root Metaid with {node_name}"),
        ));

        Ok(drafts)
    }

    /// Write a content entry for this schema.
    ///
    /// With [`SerialAction::Combo`] the new draft joins
    /// `options.drafts` and the combined batch is returned unsubmitted;
    /// with [`SerialAction::Finish`] the batch is paid, broadcast, and
    /// the indexer notified in one delegated sequence.
    pub async fn create(&self, body: Option<&str>, options: CreateOptions) -> Result<CreateResult> {
        self.connector.guard()?;
        if !self.connector.chain().supports_writes() {
            return Err(MetaidError::NotSupported);
        }

        let balance = self.connector.wallet().get_balance().await?;
        if balance.total() < self.config.dust_limit {
            return Err(MetaidError::InsufficientBalance);
        }

        let payload = build_generic_payload(
            options.operation,
            &options.path,
            options.encryption,
            body,
            &options.data_type,
            &options.encoding,
        )?;
        let mut composer = TxComposer::new();
        composer.append_data_output(payload)?;

        let mut drafts = options.drafts;
        drafts.push(DraftTransaction::new(
            composer,
            format!("Create {}", self.schema.name),
        ));

        match options.serial_action {
            SerialAction::Combo => Ok(CreateResult::Drafts(drafts)),
            SerialAction::Finish => {
                let txid = self.submit(drafts).await?;
                Ok(CreateResult::Submitted { txid })
            }
        }
    }

    /// Pay, broadcast, and notify one draft batch. Returns the final
    /// transaction's id.
    async fn submit(&self, drafts: Vec<DraftTransaction>) -> Result<String> {
        let wallet = self.connector.wallet().clone();
        let paid = wallet.pay(drafts).await?;
        let last = paid.last().ok_or_else(|| {
            MetaidError::InvalidState("wallet returned an empty signed set".to_string())
        })?;
        let txid = last.txid()?;
        let tx_hex = last.raw_hex()?;

        wallet.batch_broadcast(&paid).await?;
        self.connector.indexer().notify(&tx_hex).await?;
        tracing::debug!(%txid, entity = %self.schema.name, "draft batch submitted");
        Ok(txid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{mock_address, MockIndexer, MockWallet, RootQuery};
    use crate::domain::Utxo;

    async fn buzz_entity(
        wallet: Arc<MockWallet>,
        indexer: Arc<MockIndexer>,
    ) -> Entity {
        let connector = Connector::connect(wallet, indexer).await.unwrap();
        Entity::with_config(connector, Schema::buzz(), MetaidConfig::for_testing())
    }

    fn parent_with_address(address: &str) -> NodeParent {
        NodeParent {
            address: Some(address.to_string()),
            public_key: "02abcd".to_string(),
            txid: "bb".repeat(32),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_list_returns_fixed_page_limit() {
        let indexer = Arc::new(MockIndexer::new());
        let entity = buzz_entity(Arc::new(MockWallet::default()), indexer.clone()).await;

        indexer.insert_buzz(Buzz {
            txid: "t1".to_string(),
            metaid: entity.metaid().to_string(),
            content: "hello".to_string(),
            timestamp: 1700000000,
        });

        let page = entity.list(0).await.unwrap();
        assert_eq!(page.limit, 50);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_list_rejected_for_non_feed_schema() {
        let wallet = Arc::new(MockWallet::default());
        let indexer = Arc::new(MockIndexer::new());
        let connector = Connector::connect(wallet, indexer).await.unwrap();
        let schema = Schema::new(
            "file",
            "MetaFile",
            vec![crate::domain::SchemaVersion {
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
        assert!(matches!(
            entity.one("t1").await,
            Err(MetaidError::NotSupported)
        ));
    }

    #[tokio::test]
    async fn test_one_finds_buzz_by_txid() {
        let indexer = Arc::new(MockIndexer::new());
        let entity = buzz_entity(Arc::new(MockWallet::default()), indexer.clone()).await;

        indexer.insert_buzz(Buzz {
            txid: "t9".to_string(),
            metaid: "someone".to_string(),
            content: "post".to_string(),
            timestamp: 1700000000,
        });

        let found = entity.one("t9").await.unwrap();
        assert_eq!(found.unwrap().content, "post");
        assert!(entity.one("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_root_requires_connection() {
        let entity = buzz_entity(
            Arc::new(MockWallet::default()),
            Arc::new(MockIndexer::new()),
        )
        .await;
        entity.disconnect();
        assert!(matches!(
            entity.get_root().await,
            Err(MetaidError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_get_root_memoized_across_calls() {
        let wallet = Arc::new(MockWallet::default());
        let indexer = Arc::new(MockIndexer::new());
        let entity = buzz_entity(wallet.clone(), indexer.clone()).await;

        let query = RootQuery {
            metaid: entity.metaid().to_string(),
            node_name: entity.schema().node_name.clone(),
            node_id: entity.schema().current_version().id.clone(),
        };
        indexer.insert_root(
            &query,
            Root {
                id: "r1".to_string(),
                node_name: query.node_name.clone(),
                address: "addr".to_string(),
                txid: "t1".to_string(),
                public_key: "pk".to_string(),
                parent_txid: "t0".to_string(),
                parent_public_key: "ppk".to_string(),
                version: "1.0.0".to_string(),
                created_at: 1700000000,
            },
        );

        let first = entity.get_root().await.unwrap();
        let second = entity.get_root().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(wallet.write_call_count(), 0);
    }

    #[tokio::test]
    async fn test_create_metaid_root_returns_unsubmitted_batch() {
        let wallet = Arc::new(MockWallet::default());
        let indexer = Arc::new(MockIndexer::new());
        let entity = buzz_entity(wallet.clone(), indexer.clone()).await;

        let parent_address = mock_address(0xC3);
        let drafts = entity
            .create_metaid_root(&parent_with_address(&parent_address), "SimpleMicroblog")
            .await
            .unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].message, "Create link dust utxo");
        assert!(drafts[1].message.contains("SimpleMicroblog"));
        // nothing was paid or broadcast
        assert_eq!(wallet.write_call_count(), 0);
        assert_eq!(indexer.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_create_metaid_root_reuses_parent_dust() {
        let wallet = Arc::new(MockWallet::with_balance(0));
        let indexer = Arc::new(MockIndexer::new());
        let entity = buzz_entity(wallet, indexer.clone()).await;

        let parent_address = mock_address(0xC3);
        indexer.insert_utxos(
            &parent_address,
            vec![Utxo {
                txid: "dd".repeat(32),
                out_index: 0,
                value: 700,
            }],
        );

        let drafts = entity
            .create_metaid_root(&parent_with_address(&parent_address), "SimpleMicroblog")
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].composer.input(0).unwrap().txid, "dd".repeat(32));
    }

    #[tokio::test]
    async fn test_create_metaid_root_without_parent_address() {
        let entity = buzz_entity(
            Arc::new(MockWallet::default()),
            Arc::new(MockIndexer::new()),
        )
        .await;

        let parent = NodeParent {
            address: None,
            public_key: "02abcd".to_string(),
            txid: "bb".repeat(32),
            body: None,
        };
        let drafts = entity
            .create_metaid_root(&parent, "SimpleMicroblog")
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].composer.inputs().is_empty());
        assert!(drafts[0].composer.has_data_output());
    }

    #[tokio::test]
    async fn test_create_finish_submits_and_notifies() {
        let wallet = Arc::new(MockWallet::default());
        let indexer = Arc::new(MockIndexer::new());
        let entity = buzz_entity(wallet.clone(), indexer.clone()).await;

        let options = CreateOptions {
            path: "/protocols/simplebuzz".to_string(),
            ..Default::default()
        };
        let result = entity
            .create(Some("{\"content\":\"hi\"}"), options)
            .await
            .unwrap();

        match result {
            CreateResult::Submitted { txid } => assert!(!txid.is_empty()),
            CreateResult::Drafts(_) => panic!("expected submission"),
        }
        assert_eq!(wallet.pay_call_count(), 1);
        assert_eq!(wallet.broadcast_call_count(), 1);
        assert_eq!(indexer.notified_hexes().len(), 1);
    }

    #[tokio::test]
    async fn test_create_combo_accumulates_drafts() {
        let wallet = Arc::new(MockWallet::default());
        let entity = buzz_entity(wallet.clone(), Arc::new(MockIndexer::new())).await;

        let first = entity
            .create(
                Some("one"),
                CreateOptions {
                    path: "/protocols/simplebuzz".to_string(),
                    data_type: "text/plain".to_string(),
                    serial_action: SerialAction::Combo,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let carried = match first {
            CreateResult::Drafts(drafts) => drafts,
            CreateResult::Submitted { .. } => panic!("combo must not submit"),
        };
        assert_eq!(carried.len(), 1);
        assert_eq!(wallet.write_call_count(), 0);

        let second = entity
            .create(
                Some("two"),
                CreateOptions {
                    path: "/protocols/simplebuzz".to_string(),
                    data_type: "text/plain".to_string(),
                    serial_action: SerialAction::Finish,
                    drafts: carried,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(second, CreateResult::Submitted { .. }));

        // both logical writes went on-chain in a single pay batch
        assert_eq!(wallet.pay_call_count(), 1);
        assert_eq!(wallet.last_pay_batch().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_insufficient_balance_before_signing() {
        let wallet = Arc::new(MockWallet::with_balance(10));
        let entity = buzz_entity(wallet.clone(), Arc::new(MockIndexer::new())).await;

        let result = entity
            .create(
                Some("hi"),
                CreateOptions {
                    path: "/protocols/simplebuzz".to_string(),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(MetaidError::InsufficientBalance)));
        assert_eq!(wallet.pay_call_count(), 0);
    }
}
