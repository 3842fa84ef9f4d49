use std::collections::HashSet;

use proxetta::{
    jvm::{Class, field, method},
    proxy::{
        AdviceCache, Aspect, ErrorKind, MethodSignature, Proxetta, ProxettaConfig, ProxyClass,
        ProxyNames, ProxyRequest,
        pointcut::{self, PointcutExt},
    },
};

mod common;

use common::{find_method, listing, parse};

const CALCULATOR: &str = "org/proxetta/test/Calculator";

fn build(aspects: Vec<Aspect>, request: &ProxyRequest) -> Result<Option<ProxyClass>, ErrorKind> {
    let loader = common::test_loader();
    let cache = AdviceCache::new();
    Proxetta::new(&loader)
        .with_advice_cache(&cache)
        .with_aspects(aspects)
        .build(request)
        .map_err(proxetta::proxy::Error::into_kind)
}

fn woven(aspects: Vec<Aspect>, request: &ProxyRequest) -> Class {
    let proxy = build(aspects, request)
        .unwrap()
        .expect("the proxy should be applied");
    parse(&proxy.bytes)
}

fn counting_on(method_name: &str) -> Aspect {
    Aspect::new(
        "org.proxetta.test.CountingAdvice",
        pointcut::match_method_name(method_name),
    )
}

#[test]
fn subclass_overrides_matched_methods() {
    let class = woven(
        vec![counting_on("add")],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    );
    assert_eq!(class.binary_name, "org/proxetta/test/Calculator$$Proxetta");
    assert_eq!(
        class.super_class.as_ref().map(|it| it.binary_name.as_str()),
        Some(CALCULATOR)
    );
    assert!(!class.is_abstract());

    let add = find_method(&class, "add");
    assert_eq!(
        listing(add.body.as_ref().unwrap()),
        [
            "aload 0",
            "iload 1",
            "iload 2",
            "invokespecial org/proxetta/test/Calculator$$Proxetta::add$0(II)I",
            "ireturn",
        ]
    );
    let chain = find_method(&class, "add$0");
    assert!(
        chain
            .access_flags
            .contains(method::AccessFlags::PRIVATE | method::AccessFlags::FINAL)
    );
    let chain_code = listing(chain.body.as_ref().unwrap());
    assert!(chain_code.contains(&"invokespecial org/proxetta/test/Calculator::add(II)I".to_owned()));
    assert!(
        chain_code.contains(&"getfield org/proxetta/test/Calculator$$Proxetta.$__calls$0".to_owned())
    );
    assert!(
        chain_code
            .contains(&"putstatic org/proxetta/test/Calculator$$Proxetta.$__total$0".to_owned())
    );

    // Unmatched methods are inherited.
    assert!(class.methods.iter().all(|it| it.name != "twice"));
}

#[test]
fn advice_members_are_copied() {
    let class = woven(
        vec![counting_on("add")],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    );
    let calls = class.fields.iter().find(|it| it.name == "$__calls$0").unwrap();
    assert!(calls.access_flags.contains(field::AccessFlags::PRIVATE));
    let total = class.fields.iter().find(|it| it.name == "$__total$0").unwrap();
    assert!(total.access_flags.contains(field::AccessFlags::STATIC));

    let advice_init = find_method(&class, "$__init$0");
    assert!(advice_init.access_flags.contains(method::AccessFlags::PRIVATE));
    assert!(
        listing(advice_init.body.as_ref().unwrap())
            .iter()
            .all(|it| !it.contains("java/lang/Object::<init>"))
    );

    let constructors: Vec<_> = class
        .methods
        .iter()
        .filter(|it| it.is_constructor())
        .collect();
    assert_eq!(constructors.len(), 2);
    for constructor in constructors {
        let code = listing(constructor.body.as_ref().unwrap());
        assert_eq!(
            code.last().map(String::as_str),
            Some("return"),
            "{}",
            constructor.descriptor
        );
        assert!(code.contains(
            &"invokespecial org/proxetta/test/Calculator$$Proxetta::$__init()V".to_owned()
        ));
    }
    let init = listing(find_method(&class, "$__init").body.as_ref().unwrap());
    assert!(init.contains(
        &"invokespecial org/proxetta/test/Calculator$$Proxetta::$__init$0()V".to_owned()
    ));
}

#[test]
fn aspects_chain_in_order() {
    let class = woven(
        vec![
            counting_on("add"),
            Aspect::new("org/proxetta/test/DoublingAdvice", pointcut::match_method_name("add")),
        ],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    );
    let first = listing(find_method(&class, "add$0").body.as_ref().unwrap());
    assert!(first.contains(
        &"invokespecial org/proxetta/test/Calculator$$Proxetta::add$1(II)I".to_owned()
    ));
    assert!(!first.contains(&"invokespecial org/proxetta/test/Calculator::add(II)I".to_owned()));
    let second = listing(find_method(&class, "add$1").body.as_ref().unwrap());
    assert!(second.contains(&"invokespecial org/proxetta/test/Calculator::add(II)I".to_owned()));
}

#[test]
fn static_methods_are_invoked_statically() {
    let class = woven(
        vec![Aspect::new(
            "org/proxetta/test/DoublingAdvice",
            pointcut::match_method_name("square"),
        )],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    );
    let square = find_method(&class, "square");
    assert!(square.is_static());
    let chain = find_method(&class, "square$0");
    assert!(chain.is_static());
    assert!(
        listing(chain.body.as_ref().unwrap())
            .contains(&"invokestatic org/proxetta/test/Calculator::square(I)I".to_owned())
    );
}

#[test]
fn advices_using_this_are_rejected_in_static_methods() {
    let error = build(
        vec![counting_on("square")],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    )
    .unwrap_err();
    assert!(matches!(error, ErrorKind::StaticContext));
}

#[test]
fn intrinsics_are_replaced() {
    let class = woven(
        vec![Aspect::new(
            "org/proxetta/test/NamingAdvice",
            pointcut::match_method_name("add"),
        )],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    );
    let chain = listing(find_method(&class, "add$0").body.as_ref().unwrap());
    assert!(chain.iter().all(|it| !it.contains("ProxyTarget")));
    assert!(chain.contains(&"ldc String(\"add\")".to_owned()));
    assert!(chain.contains(&"ldc String(\"sum\")".to_owned()));
}

#[test]
fn arguments_are_replaced() {
    let class = woven(
        vec![Aspect::new(
            "org/proxetta/test/ArgumentAdvice",
            pointcut::match_method_name("add"),
        )],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    );
    let chain = listing(find_method(&class, "add$0").body.as_ref().unwrap());
    assert!(chain.contains(&"istore 1".to_owned()));
    assert!(chain.contains(&"invokevirtual java/lang/Number::intValue()I".to_owned()));
}

#[test]
fn info_is_materialized() {
    let class = woven(
        vec![Aspect::new(
            "org/proxetta/test/InfoAdvice",
            pointcut::match_method_name("twice"),
        )],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    );
    let chain = listing(find_method(&class, "twice$0").body.as_ref().unwrap());
    assert!(chain.contains(&"new org/proxetta/ProxyTargetInfo".to_owned()));
    assert!(chain.contains(&"putfield org/proxetta/ProxyTargetInfo.targetMethodName".to_owned()));
    assert!(chain.contains(&"putstatic org/proxetta/test/Calculator$$Proxetta.$__last$0".to_owned()));
}

#[test]
fn advice_helpers_do_not_clash_with_chains() {
    let class = woven(
        vec![Aspect::new(
            "org/proxetta/test/HelperAdvice",
            pointcut::match_method_name("twice"),
        )],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    );
    let members: HashSet<_> = class
        .methods
        .iter()
        .map(|it| (it.name.as_str(), it.descriptor.to_string()))
        .collect();
    assert_eq!(members.len(), class.methods.len());
    assert!(members.contains(&("twice$0", "(J)J".to_owned())));
    assert!(members.contains(&("$__twice$0", "(J)J".to_owned())));

    let chain = listing(find_method(&class, "twice$0").body.as_ref().unwrap());
    assert!(
        chain
            .iter()
            .any(|it| it.ends_with("org/proxetta/test/Calculator$$Proxetta::$__twice$0(J)J")),
        "{chain:?}"
    );
}

#[test]
fn duplicate_members_are_rejected() {
    let loader = common::test_loader();
    let cache = AdviceCache::new();
    let names = ProxyNames {
        advice_method_prefix: String::new(),
        ..ProxyNames::default()
    };
    let error = Proxetta::new(&loader)
        .with_advice_cache(&cache)
        .with_config(ProxettaConfig::default().with_names(names))
        .with_aspect(Aspect::new(
            "org/proxetta/test/HelperAdvice",
            pointcut::match_method_name("twice"),
        ))
        .build(&ProxyRequest::subclass("org.proxetta.test.Calculator"))
        .unwrap_err();
    assert!(
        matches!(error.kind(), ErrorKind::InvalidAdvice(message) if message.contains("twice$0(J)J")),
        "{error}"
    );
}

#[test]
fn final_methods_are_rejected() {
    let error = build(
        vec![counting_on("fixed")],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    )
    .unwrap_err();
    assert!(matches!(error, ErrorKind::FinalMethodConflict));
}

#[test]
fn final_classes_are_rejected() {
    let error = build(
        vec![counting_on("*")],
        &ProxyRequest::subclass("org.proxetta.test.FinalService"),
    )
    .unwrap_err();
    assert!(matches!(error, ErrorKind::InvalidTarget(_)));
}

#[test]
fn out_of_range_arguments_are_rejected() {
    let error = build(
        vec![Aspect::new(
            "org/proxetta/test/OutOfRangeAdvice",
            pointcut::match_method_name("add"),
        )],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    )
    .unwrap_err();
    assert!(matches!(
        error,
        ErrorKind::InvalidArgumentIndex { index: 5, count: 2 }
    ));
}

#[test]
fn dynamic_call_sites_are_rejected() {
    let loader = common::test_loader();
    let cache = AdviceCache::new();
    let error = Proxetta::new(&loader)
        .with_advice_cache(&cache)
        .with_aspect(Aspect::new(
            "org/proxetta/test/LambdaAdvice",
            pointcut::match_method_name("add"),
        ))
        .build(&ProxyRequest::subclass(CALCULATOR))
        .unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidAdvice(_)));
    assert_eq!(error.advice(), Some("org/proxetta/test/LambdaAdvice"));
    assert_eq!(error.target(), CALCULATOR);
}

#[test]
fn nothing_matched() {
    let proxy = build(
        vec![counting_on("missing*")],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    )
    .unwrap();
    assert!(proxy.is_none());
}

#[test]
fn forced_proxies_are_built() {
    let loader = common::test_loader();
    let cache = AdviceCache::new();
    let proxy = Proxetta::new(&loader)
        .with_advice_cache(&cache)
        .with_aspect(counting_on("missing*"))
        .with_config(ProxettaConfig::default().with_forced(true))
        .build(&ProxyRequest::subclass(CALCULATOR))
        .unwrap()
        .unwrap();
    let class = parse(&proxy.bytes);
    assert!(class.methods.iter().all(|it| !it.name.starts_with("add")));
    assert_eq!(class.methods.iter().filter(|it| it.is_constructor()).count(), 2);
}

#[test]
fn wrapper_of_interface() {
    let class = woven(
        vec![Aspect::new(
            "org/proxetta/test/NamingAdvice",
            pointcut::match_method_name("greet"),
        )],
        &ProxyRequest::wrapper("org.proxetta.test.Greeter"),
    );
    assert_eq!(class.binary_name, "org/proxetta/test/Greeter$$Clonetou");
    assert_eq!(
        class.super_class.as_ref().map(|it| it.binary_name.as_str()),
        Some("java/lang/Object")
    );
    let interfaces: Vec<_> = class.interfaces.iter().map(|it| it.binary_name.as_str()).collect();
    assert_eq!(interfaces, ["org/proxetta/test/Greeter"]);

    let target = class.fields.iter().find(|it| it.name == "_target").unwrap();
    assert!(target.access_flags.contains(field::AccessFlags::PUBLIC));
    assert_eq!(target.field_type.to_string(), "org.proxetta.test.Greeter");

    let chain = listing(find_method(&class, "greet$0").body.as_ref().unwrap());
    assert!(chain.contains(
        &"invokeinterface org/proxetta/test/Greeter::greet(Ljava/lang/String;)Ljava/lang/String;"
            .to_owned()
    ));
    let hello = listing(find_method(&class, "hello").body.as_ref().unwrap());
    assert_eq!(
        hello,
        [
            "aload 0",
            "getfield org/proxetta/test/Greeter$$Clonetou._target",
            "invokeinterface org/proxetta/test/Greeter::hello()Ljava/lang/String;",
            "areturn",
        ]
    );
}

#[test]
fn wrapper_creates_target() {
    let class = woven(
        vec![Aspect::new(
            "org/proxetta/test/CountingAdvice",
            pointcut::match_method_name("get*").and(pointcut::all_public_methods()),
        )],
        &ProxyRequest::wrapper("org.proxetta.test.Calculator")
            .with_target_field("delegate")
            .create_target_in_default_constructor(true),
    );
    let delegate = class.fields.iter().find(|it| it.name == "delegate").unwrap();
    assert!(
        delegate
            .access_flags
            .contains(field::AccessFlags::PRIVATE | field::AccessFlags::FINAL)
    );
    let constructor = listing(find_method(&class, "<init>").body.as_ref().unwrap());
    assert!(constructor.contains(&"new org/proxetta/test/Calculator".to_owned()));
    assert!(constructor.contains(
        &"putfield org/proxetta/test/Calculator$$Clonetou.delegate".to_owned()
    ));
    assert!(class.methods.iter().any(|it| it.name == "getBase$0"));
    assert!(class.methods.iter().all(|it| it.name != "square"));
}

#[test]
fn custom_class_names() {
    let proxy = build(
        vec![counting_on("add")],
        &ProxyRequest::subclass("org.proxetta.test.Calculator").with_class_name(".gen."),
    )
    .unwrap()
    .unwrap();
    assert_eq!(proxy.name, "org/proxetta/test/gen/Calculator$$Proxetta");
    assert_eq!(proxy.java_name(), "org.proxetta.test.gen.Calculator$$Proxetta");
}

#[test]
fn weaving_is_deterministic() {
    let aspects = || {
        vec![
            counting_on("add"),
            Aspect::new(
                "org/proxetta/test/InfoAdvice",
                pointcut::all_public_methods().and(|it: &MethodSignature| !it.is_final()),
            ),
        ]
    };
    let request = ProxyRequest::subclass("org.proxetta.test.Calculator");
    let first = build(aspects(), &request).unwrap().unwrap();
    let second = build(aspects(), &request).unwrap().unwrap();
    assert_eq!(first, second);
}

#[test]
fn same_named_advice_fields_do_not_collide() {
    let class = woven(
        vec![
            Aspect::new("org/proxetta/test/CounterAdvice", pointcut::match_method_name("touch")),
            Aspect::new(
                "org/proxetta/test/OtherCounterAdvice",
                pointcut::match_method_name("touch"),
            ),
        ],
        &ProxyRequest::subclass("org.proxetta.test.Calculator"),
    );
    let mut counters: Vec<_> = class
        .fields
        .iter()
        .filter(|it| it.name.starts_with("$__counter"))
        .map(|it| it.name.as_str())
        .collect();
    counters.sort_unstable();
    assert_eq!(counters, ["$__counter$0", "$__counter$1"]);
    assert!(
        listing(find_method(&class, "touch$1").body.as_ref().unwrap())
            .contains(&"putfield org/proxetta/test/Calculator$$Proxetta.$__counter$1".to_owned())
    );
}
