use metacollab_core::{Chain, ChainConfig, CollabError, Deployed};
use metacollab_types::{Address, Bytes32, Event, FactoryEvent};

fn signer(byte: u8) -> Address {
    Address::new([byte; 20])
}

struct Deployment {
    chain: Chain,
    template: Address,
    factory: Address,
}

fn deployment() -> Deployment {
    let mut chain = Chain::new(ChainConfig {
        genesis_timestamp: Some(1_700_000_000),
    });
    let deployer = signer(0xd0);
    let template = chain.deploy_template(&deployer).unwrap();
    let factory = chain.deploy_factory(&deployer, template).unwrap();
    Deployment {
        chain,
        template,
        factory,
    }
}

#[test]
fn test_deploys_with_zero_collab_count() {
    let d = deployment();
    let factory = d.chain.collab_factory(&d.factory).unwrap();
    assert_eq!(factory.collab_count(), 0);
    assert_eq!(factory.implementation(), d.template);
    assert_eq!(factory.collab_address(0), None);
}

#[test]
fn test_rejects_zero_implementation() {
    let mut chain = Chain::default();
    let result = chain.deploy_factory(&signer(1), Address::ZERO);
    assert_eq!(result, Err(CollabError::InvalidImplementation));
}

#[test]
fn test_template_cannot_be_initialized() {
    let mut d = deployment();
    let result = d
        .chain
        .collab(d.template)
        .from(signer(1))
        .init(signer(1), signer(2), signer(3));
    assert_eq!(result, Err(CollabError::AlreadyInitialized));
}

#[test]
fn test_create_deploys_initialized_clone() {
    let mut d = deployment();
    let (funder, doer) = (signer(1), signer(2));
    let collab = d.chain.factory(d.factory).from(funder).create(funder, doer).unwrap();

    assert_eq!(
        d.chain.events_of(&d.factory),
        vec![&Event::Factory(FactoryEvent::LogNewCollab { index: 0, collab })]
    );
    assert!(matches!(d.chain.deployed(&collab), Some(Deployed::Agreement(_))));

    let agreement = d.chain.agreement(&collab).unwrap();
    assert_eq!(agreement.funder(), funder);
    assert_eq!(agreement.doer(), doer);
    assert_eq!(agreement.fee_store(), d.factory);
    assert_eq!(agreement.implementation(), Some(d.template));
    assert_eq!(
        d.chain.collab_factory(&d.factory).unwrap().collab_address(0),
        Some(collab)
    );
}

#[test]
fn test_predicts_deterministic_address() {
    let mut d = deployment();
    let predicted = d
        .chain
        .collab_factory(&d.factory)
        .unwrap()
        .predict_deterministic_address(&Bytes32::ZERO);

    let collab = d
        .chain
        .factory(d.factory)
        .from(signer(1))
        .create_deterministic(signer(1), signer(2), Bytes32::ZERO)
        .unwrap();

    assert_eq!(collab, predicted);
    assert_eq!(
        d.chain.events_of(&d.factory),
        vec![&Event::Factory(FactoryEvent::LogNewCollab { index: 0, collab })]
    );
    assert_eq!(
        d.chain.collab_factory(&d.factory).unwrap().collab_address(0),
        Some(collab)
    );
}

#[test]
fn test_reused_salt_fails() {
    let mut d = deployment();
    let salt = Bytes32::new([0x42; 32]);
    d.chain
        .factory(d.factory)
        .from(signer(1))
        .create_deterministic(signer(1), signer(2), salt)
        .unwrap();

    let again = d
        .chain
        .factory(d.factory)
        .from(signer(3))
        .create_deterministic(signer(3), signer(4), salt);
    assert_eq!(again, Err(CollabError::CloneFailed));

    let factory = d.chain.collab_factory(&d.factory).unwrap();
    assert_eq!(factory.collab_count(), 1);
    assert_eq!(d.chain.events_of(&d.factory).len(), 1);
}

#[test]
fn test_collab_count_and_index() {
    let mut d = deployment();
    let (funder, doer) = (signer(1), signer(2));

    let first = d.chain.factory(d.factory).from(funder).create(funder, doer).unwrap();
    assert_eq!(d.chain.collab_factory(&d.factory).unwrap().collab_count(), 1);

    let second = d.chain.factory(d.factory).from(funder).create(funder, doer).unwrap();
    assert_ne!(first, second);

    let factory = d.chain.collab_factory(&d.factory).unwrap();
    assert_eq!(factory.collab_count(), 2);
    assert_eq!(factory.collab_address(0), Some(first));
    assert_eq!(factory.collab_address(1), Some(second));
    assert_eq!(factory.collab_address(2), None);
}

#[test]
fn test_mixed_deployments_never_collide() {
    let mut d = deployment();
    let salted = d
        .chain
        .factory(d.factory)
        .from(signer(1))
        .create_deterministic(signer(1), signer(2), Bytes32::ZERO)
        .unwrap();
    let plain = d
        .chain
        .factory(d.factory)
        .from(signer(1))
        .create(signer(1), signer(2))
        .unwrap();

    assert_ne!(salted, plain);
    assert_eq!(d.chain.collab_factory(&d.factory).unwrap().collab_count(), 2);
}

#[test]
fn test_update_flat_fee() {
    let mut d = deployment();
    let resolver = signer(3);
    assert_eq!(d.chain.collab_factory(&d.factory).unwrap().flat_fees(&resolver), 0);

    d.chain
        .factory(d.factory)
        .from(resolver)
        .update_flat_fee(10, Bytes32::ZERO)
        .unwrap();

    assert_eq!(d.chain.collab_factory(&d.factory).unwrap().flat_fees(&resolver), 10);
    assert_eq!(
        d.chain.events_of(&d.factory),
        vec![&Event::Factory(FactoryEvent::UpdateFlatFee {
            resolver,
            fee: 10,
            reference: Bytes32::ZERO,
        })]
    );
}

#[test]
fn test_flat_fee_is_per_resolver() {
    let mut d = deployment();
    d.chain
        .factory(d.factory)
        .from(signer(3))
        .update_flat_fee(10, Bytes32::ZERO)
        .unwrap();
    d.chain
        .factory(d.factory)
        .from(signer(3))
        .update_flat_fee(25, Bytes32::new([1; 32]))
        .unwrap();

    let factory = d.chain.collab_factory(&d.factory).unwrap();
    assert_eq!(factory.flat_fees(&signer(3)), 25);
    assert_eq!(factory.flat_fees(&signer(4)), 0);
}

#[test]
fn test_unknown_factory() {
    let mut d = deployment();
    let result = d.chain.factory(d.template).from(signer(1)).create(signer(1), signer(2));
    assert_eq!(result, Err(CollabError::UnknownContract { address: d.template }));
}
