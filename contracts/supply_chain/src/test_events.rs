extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, Env, IntoVal, String, TryIntoVal,
};

use crate::events::{ProductAdded, ProductUpdated, RoleAssigned};
use crate::{Role, SupplyChain, SupplyChainClient};

fn setup() -> (Env, SupplyChainClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();
    let owner = Address::generate(&env);
    let contract_id = env.register(SupplyChain, (owner.clone(),));
    let client = SupplyChainClient::new(&env, &contract_id);
    (env, client, owner)
}

fn setup_with_operator() -> (Env, SupplyChainClient<'static>, Address) {
    let (env, client, owner) = setup();
    let operator = Address::generate(&env);
    client.assign_role(&owner, &operator, &String::from_str(&env, "OPERATOR"));
    (env, client, operator)
}

#[test]
fn test_role_assigned_event() {
    let (env, client, owner) = setup();
    let viewer = Address::generate(&env);

    client.assign_role(&owner, &viewer, &String::from_str(&env, "VIEWER"));

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("role_set"), target)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("role_set").into_val(&env),
        viewer.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: RoleAssigned = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        RoleAssigned {
            target: viewer.clone(),
            role: Role::Viewer,
            assigned_by: owner.clone(),
        }
    );
}

#[test]
fn test_product_added_event() {
    let (env, client, operator) = setup_with_operator();
    let name = String::from_str(&env, "Test Product");

    let id = client.add_product(
        &operator,
        &name,
        &String::from_str(&env, "Warehouse A"),
        &String::from_str(&env, "In Stock"),
    );

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("added"), product_id)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("added").into_val(&env),
        id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: ProductAdded = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        ProductAdded {
            product_id: 1,
            name,
            location: String::from_str(&env, "Warehouse A"),
            status: String::from_str(&env, "In Stock"),
            added_by: operator.clone(),
        }
    );
}

#[test]
fn test_product_updated_event() {
    let (env, client, operator) = setup_with_operator();
    let id = client.add_product(
        &operator,
        &String::from_str(&env, "Test Product"),
        &String::from_str(&env, "Warehouse A"),
        &String::from_str(&env, "In Stock"),
    );

    let status = String::from_str(&env, "Shipped");
    let location = String::from_str(&env, "In Transit");
    client.update_product(&operator, &id, &status, &location);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("updated"), product_id)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("updated").into_val(&env),
        id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: ProductUpdated = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        ProductUpdated {
            product_id: id,
            status,
            location,
        }
    );
}

/// A rejected call must not publish anything.
#[test]
fn test_failed_calls_emit_no_events() {
    let (env, client, owner) = setup();
    let stranger = Address::generate(&env);

    let _ = client.try_add_product(
        &stranger,
        &String::from_str(&env, "Test Product"),
        &String::from_str(&env, "Warehouse A"),
        &String::from_str(&env, "In Stock"),
    );
    assert_eq!(env.events().all().len(), 0);

    let _ = client.try_assign_role(&owner, &stranger, &String::from_str(&env, "SUPERVISOR"));
    assert_eq!(env.events().all().len(), 0);
}
