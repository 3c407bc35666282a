use heck::{ToKebabCase, ToShoutySnakeCase, ToSnakeCase};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Derives a layered loader for a struct of required string settings.
///
/// For `struct Credentials { telegram_token: String }` this generates a
/// `credentials::Credentials` builder with every field optional, filled in
/// order from the kdl config file, the `TELEGRAM_TOKEN` environment variable
/// and the `--telegram-token` flag. `Credentials::try_from(builder)` then
/// fails with `hwbot_config::MissingConfigurationError` for the first field
/// still unset.
#[proc_macro_derive(AppConfig)]
pub fn app_config_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match expand(&ast) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

fn expand(ast: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &ast.ident;
    let namespace = syn::Ident::new(
        &format!("{}", &struct_name).to_snake_case(),
        struct_name.span(),
    );

    let fields = match &ast.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(named),
            ..
        }) => &named.named,
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "AppConfig can only be derived for structs with named fields",
            ))
        }
    };

    let mut try_gen = Vec::new();
    let mut field_gen = Vec::new();
    let mut debug_gen = Vec::new();
    let mut cli_gen = Vec::new();
    let mut cli_args_gen = Vec::new();
    let mut env_gen = Vec::new();
    let mut config_gen = Vec::new();

    for f in fields {
        let Some(field_name) = f.ident.as_ref() else {
            continue;
        };
        let field_type = &f.ty;
        let env_name = syn::LitStr::new(
            &field_name.to_string().to_shouty_snake_case(),
            field_name.span(),
        );
        let long_name = syn::LitStr::new(
            &field_name.to_string().to_kebab_case(),
            field_name.span(),
        );
        let help = syn::LitStr::new(
            &format!("Overrides the {} environment variable", env_name.value()),
            field_name.span(),
        );

        try_gen.push(quote! {
            #field_name: ::hwbot_config::require(value.#field_name, #env_name)?,
        });

        field_gen.push(quote! {
            pub #field_name: Option<#field_type>,
        });

        debug_gen.push(quote! {
            .field(stringify!(#field_name), &self.#field_name.as_ref().map(|_| "***"))
        });

        cli_gen.push(quote! {
            if let Some(#field_name) = matches.remove_one::<#field_type>(stringify!(#field_name)) {
                self.#field_name = Some(#field_name);
            }
        });

        cli_args_gen.push(quote! {
            .arg(
                ::clap::Arg::new(stringify!(#field_name))
                    .long(#long_name)
                    .action(::clap::ArgAction::Set)
                    .help(#help)
                    .help_heading("Config")
                    .global(true)
            )
        });

        env_gen.push(quote! {
            if let Some(item) = lookup(#env_name) {
                self.#field_name = Some(item);
            }
        });

        config_gen.push(quote! {
            if let Some(item) = entries.get(stringify!(#field_name)) {
                ::tracing::debug!("found config item: {}", stringify!(#field_name));
                self.#field_name = Some(item.clone());
            }
        });
    }

    let try_gen = try_gen.into_iter().collect::<TokenStream2>();
    let field_gen = field_gen.into_iter().collect::<TokenStream2>();
    let debug_gen = debug_gen.into_iter().collect::<TokenStream2>();
    let cli_gen = cli_gen.into_iter().collect::<TokenStream2>();
    let cli_args_gen = cli_args_gen.into_iter().collect::<TokenStream2>();
    let env_gen = env_gen.into_iter().collect::<TokenStream2>();
    let config_gen = config_gen.into_iter().collect::<TokenStream2>();

    Ok(quote! {
        impl #struct_name {
            pub fn from(
                conf: #namespace::#struct_name,
            ) -> Result<Self, ::hwbot_config::MissingConfigurationError> {
                conf.try_into()
            }
        }

        impl TryFrom<#namespace::#struct_name> for #struct_name {
            type Error = ::hwbot_config::MissingConfigurationError;

            fn try_from(value: #namespace::#struct_name) -> Result<Self, Self::Error> {
                Ok(Self {
                    #try_gen
                })
            }
        }

        pub mod #namespace {
            #[derive(Default, Clone)]
            pub struct #struct_name {
                pub config_file: Option<::std::path::PathBuf>,

                #field_gen
            }

            impl ::std::fmt::Debug for #struct_name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.debug_struct(stringify!(#struct_name))
                        .field("config_file", &self.config_file)
                        #debug_gen
                        .finish()
                }
            }

            impl #struct_name {
                fn apply_sources(&mut self, matches: &mut ::clap::ArgMatches) {
                    use ::hwbot_config::{ConfigFile, Env};

                    self.config_file = matches
                        .remove_one::<String>("config-file")
                        .map(::std::path::PathBuf::from)
                        .or_else(::hwbot_config::default_config_file);

                    if let Some(config) = self.config_file.clone() {
                        if let Err(e) = self.set_from_config_file(&config) {
                            ::tracing::warn!("failed to read config from file: {e}");
                        }
                    }
                    if let Err(e) = self.set_from_env() {
                        ::tracing::warn!("failed to read config from env: {e}");
                    }

                    #cli_gen
                }
            }

            impl ::clap::FromArgMatches for #struct_name {
                fn from_arg_matches(matches: &::clap::ArgMatches) -> Result<Self, ::clap::error::Error> {
                    let mut matches = matches.clone();
                    Self::from_arg_matches_mut(&mut matches)
                }
                fn from_arg_matches_mut(matches: &mut ::clap::ArgMatches) -> Result<Self, ::clap::error::Error> {
                    let mut s = Self::default();
                    s.apply_sources(matches);

                    Ok(s)
                }
                fn update_from_arg_matches(&mut self, matches: &::clap::ArgMatches) -> Result<(), ::clap::error::Error> {
                    let mut matches = matches.clone();
                    self.update_from_arg_matches_mut(&mut matches)
                }
                fn update_from_arg_matches_mut(&mut self, matches: &mut ::clap::ArgMatches) -> Result<(), ::clap::error::Error> {
                    self.apply_sources(matches);

                    Ok(())
                }
            }

            impl ::clap::Args for #struct_name {
                fn augment_args(cmd: ::clap::Command) -> ::clap::Command {
                    cmd
                        .arg(
                            ::clap::Arg::new("config-file")
                                .long("config-file")
                                .action(::clap::ArgAction::Set)
                                .help_heading("Config")
                                .global(true)
                        )
                    #cli_args_gen
                }
                fn augment_args_for_update(cmd: ::clap::Command) -> ::clap::Command {
                    Self::augment_args(cmd)
                }
            }

            impl ::hwbot_config::Env for #struct_name {
                fn set_from_lookup(
                    &mut self,
                    lookup: &dyn Fn(&str) -> Option<String>,
                ) -> Result<(), ::hwbot_config::EnvError> {
                    #env_gen

                    Ok(())
                }
            }

            impl ::hwbot_config::ConfigFile for #struct_name {
                fn set_from_entries(
                    &mut self,
                    entries: &::std::collections::HashMap<String, String>,
                ) {
                    #config_gen
                }
            }
        }
    })
}
